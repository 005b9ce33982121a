//! Domain models with validation at construction
//!
//! Request bodies deserialize into lenient `*Draft` types; converting a draft
//! into its validated counterpart is the only way to obtain a value storage
//! will accept.

pub mod de;
pub mod media;
pub mod status;
pub mod user;

pub use media::{
    AnimeDraft, AnimeProgressDraft, ListEntryDraft, MalId, MangaDraft, MangaProgressDraft,
    MediaKind, NewAnime, NewListEntry, NewManga, Progress, Score,
};
pub use status::{ReadStatus, TrackingStatus, WatchStatus};
pub use user::{Email, LoginDraft, NewUser, Password, SignupDraft, Username};
