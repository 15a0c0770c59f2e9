mod external_link;
mod footer;
mod now_playing;
mod progress_bar;

pub use external_link::ExternalLink;
pub use footer::Footer;
pub use now_playing::NowPlayingCard;
pub use progress_bar::ProgressBar;
