use sqlx::{Pool, Postgres};

mod maintenance;

mod user;
pub use user::{UserExt, UserFields};

mod post;
pub use post::{PostExt, PostFields};

mod project;
pub use project::{ProjectExt, ProjectFields};

mod category;
pub use category::{CategoryExt, CategoryFields};

mod video;
pub use video::{VideoExt, VideoFields};

mod slide;
pub use slide::{SlideExt, SlideFields};

mod drawing;
pub use drawing::{DrawingExt, DrawingFields};

mod feedback;
pub use feedback::FeedbackExt;

mod setting;
pub use setting::SettingExt;

mod about;
pub use about::AboutExt;

mod dashboard;
pub use dashboard::DashboardExt;

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}
impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}
