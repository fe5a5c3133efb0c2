//! Domain layer: entities, value objects and pure rules.
//!
//! Nothing here touches the database; repositories convert rows into these
//! types and services orchestrate them.

pub mod actor;
pub mod course;
pub mod enrollment;
pub mod file;
pub mod password;
pub mod progress;
pub mod report;
pub mod role;
pub mod user;

pub use actor::{Actor, Principal};
pub use course::{
    Course, CourseLevel, Lesson, Material, NewCourse, NewLesson, NewMaterial, UpdateCourse,
    UpdateLesson,
};
pub use enrollment::{CourseEnrollment, EnrolledStudent, Enrollment, EnrollmentStatus};
pub use file::{FileRecord, NewFile, Visibility};
pub use password::Password;
pub use progress::{
    CourseCompletion, CourseProgress, LessonProgressMap, ProgressRecord, ProgressStatus,
};
pub use report::{
    CertificateData, IssuedArtifact, ProgressReportRow, Report, ReportKind, ReportStatus,
    StatsReportRow,
};
pub use role::{Role, RoleName, RoleSet};
pub use user::{Profile, RegisterUser, UpdateProfile, User, UserWithRoles};
