//! Command implementations.

pub mod correct;
pub mod list;
pub mod recover;
pub mod rules;
pub mod status;

pub use self::correct::execute_correct;
pub use self::list::execute_list;
pub use self::recover::execute_recover;
pub use self::rules::execute_rules;
pub use self::status::execute_status;
