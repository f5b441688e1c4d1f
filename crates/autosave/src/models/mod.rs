pub mod photo;
pub mod resume;

pub use photo::{Attachment, Photo};
pub use resume::{
    Education, PersistedResume, ResumeContent, ResumeDocument, ResumeId, SaveResumeRequest,
    WorkExperience,
};
