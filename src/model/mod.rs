mod feedback;
mod post;
mod session;
mod user;

pub use feedback::Feedback;
pub use post::{Comment, Post};
pub use session::{Session, SessionHost, SessionMode, SessionStatus};
pub use user::{Skill, SkillLevel, User};
