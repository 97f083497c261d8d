mod dry_run;
mod gnome;
mod r#trait;

pub use self::r#trait::{create_overview, Overview};
