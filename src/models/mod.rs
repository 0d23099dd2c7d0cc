mod category;
mod flashcard;
mod user;

pub use category::Category;
pub use flashcard::FlashCard;
pub use user::UserProfile;
