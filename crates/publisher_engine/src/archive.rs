use std::path::PathBuf;

use chrono::Local;
use publisher_core::{Article, CallError, ImageReference};
use publisher_logging::pipeline_info;

use crate::convert::{Converter, Html2MdConverter};
use crate::filename::archive_filename;
use crate::frontmatter::build_archive_document;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::Clock;

/// Local safety net: failed runs leave their article in the drafts directory.
pub struct LocalDraftArchive {
    writer: AtomicFileWriter,
    clock: Clock,
    converter: Box<dyn Converter>,
}

impl LocalDraftArchive {
    pub fn new(dir: PathBuf, clock: Clock) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
            clock,
            converter: Box::new(Html2MdConverter),
        }
    }

    pub fn archive(
        &self,
        article: &Article,
        image: Option<&ImageReference>,
        reason: &CallError,
    ) -> Result<PathBuf, PersistError> {
        let now = (self.clock)();
        let filename = archive_filename(&article.title, now.with_timezone(&Local));
        let document = build_archive_document(
            article,
            image,
            reason,
            &now.to_rfc3339(),
            self.converter.as_ref(),
        );
        let path = self.writer.write_new(&filename, &document)?;
        pipeline_info!("article archived locally at {:?}", path);
        Ok(path)
    }
}
