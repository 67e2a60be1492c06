pub mod job_dedup;
pub mod job_scraper;
pub mod report_writer;
pub mod screening;

pub use job_dedup::{dedupe, JobDeduplicator};
pub use job_scraper::{search_url, CardSelectors, JobScraper};
pub use report_writer::ReportWriter;
pub use screening::{Answer, AnswerPolicy, QuestionKind};
