mod auto_checker;
mod installer;
mod loader;
mod model;

pub use auto_checker::AutoChecker;
pub use loader::Loader;
pub use model::{Action, Model, State, UserActions};

pub const UPDATE_URL: &str =
    "https://raw.githubusercontent.com/OneMoreGres/ScreenTranslator/master/updates.json";
