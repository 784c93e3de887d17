//! UI screens.

mod app;
pub mod backend;
mod login_screen;
mod market_screen;
mod splash_screen;
pub mod utils;
pub mod views;

pub use app::{App, AppPorts};
pub use login_screen::{LoginAction, LoginMode, LoginScreen, LoginState};
pub use market_screen::{MarketScreen, MarketScreenState, MarketSetup, MarketTab};
pub use splash_screen::SplashScreen;
