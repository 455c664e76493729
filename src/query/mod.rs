mod body;
pub(crate) use self::body::{encode, Body};

mod condition;
pub use self::condition::Condition;

mod get;
pub use self::get::GetQuery;

mod save;
pub use self::save::SaveRequest;
