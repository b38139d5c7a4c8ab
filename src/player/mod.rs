pub mod audio;
pub mod background;
pub mod video;

pub use audio::PlayerState;
pub use background::BackgroundPlayer;
pub use video::VideoFrame;
