mod dry_run;
mod ydotool;
mod r#trait;

pub use self::r#trait::{command_args, create_key_injector, KeyInjector};
