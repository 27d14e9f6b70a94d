//! The ingest loop: long-poll Telegram, archive channel posts.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use realmkbot_store::{PostArchive, PostRecord};
use realmkbot_telegram::{TelegramApi, TelegramError, User};

use crate::config::Config;
use crate::error::ArchiverError;
use crate::index::missing_ids;
use crate::Result;

/// Pause before retrying after a transport failure.
const TRANSIENT_RETRY_PAUSE: Duration = Duration::from_secs(5);

/// Transient-failure budget for a bounded drain.
const MAX_DRAIN_RETRIES: u32 = 3;

/// What one getUpdates batch produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchReport {
    /// Updates received in the batch
    pub updates: usize,
    /// Posts newly written to the archive
    pub archived: usize,
}

/// Aggregate statistics for an archiver session.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunReport {
    /// Non-empty batches processed
    pub batches: u64,
    /// Total updates received
    pub updates: u64,
    /// Total posts newly archived
    pub archived: u64,
}

impl RunReport {
    fn absorb(&mut self, batch: &BatchReport) {
        self.batches += 1;
        self.updates += batch.updates as u64;
        self.archived += batch.archived as u64;
    }
}

/// Drives the archive from a Telegram update stream.
///
/// Generic over the archive backend and the Telegram transport so the loop
/// can run against fakes in tests.
pub struct Archiver<A, T> {
    archive: A,
    telegram: T,
    config: Config,
}

impl<A, T> Archiver<A, T>
where
    A: PostArchive,
    T: TelegramApi,
{
    pub fn new(archive: A, telegram: T, config: Config) -> Self {
        Archiver {
            archive,
            telegram,
            config,
        }
    }

    /// The archive backend this archiver writes to.
    pub fn archive(&self) -> &A {
        &self.archive
    }

    /// The Telegram transport this archiver polls.
    pub fn telegram(&self) -> &T {
        &self.telegram
    }

    /// Verify the token against getMe and report who we are.
    pub async fn login(&self) -> Result<User> {
        let me = self.telegram.get_me().await?;
        info!(
            "Logged in as {} (@{})",
            me.first_name,
            me.username.as_deref().unwrap_or("-")
        );
        Ok(me)
    }

    /// Poll one getUpdates batch and archive every text post from the
    /// configured channel, then persist the advanced offset.
    #[instrument(skip(self), fields(chat = %self.config.chat))]
    pub async fn poll_once(&self) -> Result<BatchReport> {
        let cursor = self.archive.load_cursor(&self.config.chat).await?;
        let offset = (cursor.update_offset > 0).then_some(cursor.update_offset);

        let updates = self
            .telegram
            .get_updates(offset, self.config.poll_timeout_secs)
            .await?;

        let mut report = BatchReport {
            updates: updates.len(),
            archived: 0,
        };
        let mut next_offset = offset.unwrap_or(0);

        for update in &updates {
            next_offset = next_offset.max(update.update_id + 1);

            let Some(post) = update.channel_content() else {
                continue;
            };
            if !post.chat.is_channel(&self.config.chat) {
                continue;
            }
            let Some(text) = post.content_text() else {
                debug!("Skipping contentless post {}", post.message_id);
                continue;
            };

            let record =
                PostRecord::new(&self.config.chat, post.message_id, text, post.posted_at());
            if self.archive.archive_post(record).await? {
                report.archived += 1;
            }
        }

        if !updates.is_empty() {
            self.archive.save_offset(&self.config.chat, next_offset).await?;
        }

        debug!(
            "Batch done: {} updates, {} archived",
            report.updates, report.archived
        );
        Ok(report)
    }

    /// Number of ids below the high-water mark with no archived post.
    pub async fn gap_count(&self) -> Result<usize> {
        let present = self.archive.archived_ids(&self.config.chat).await?;
        let high = self.archive.last_index(&self.config.chat).await?;
        Ok(missing_ids(&present, high).count())
    }

    /// Poll until a batch comes back empty. Transient failures are retried
    /// a bounded number of times; anything else aborts the drain.
    pub async fn drain(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        let mut retries = 0u32;

        loop {
            match self.poll_once().await {
                Ok(batch) => {
                    retries = 0;
                    if batch.updates == 0 {
                        break;
                    }
                    report.absorb(&batch);
                }
                Err(ArchiverError::Telegram(err))
                    if err.is_transient() && retries < MAX_DRAIN_RETRIES =>
                {
                    retries += 1;
                    let pause = retry_pause(&err);
                    warn!(
                        "Transient Telegram failure (attempt {retries}), retrying in {}s: {err}",
                        pause.as_secs()
                    );
                    tokio::time::sleep(pause).await;
                }
                Err(other) => return Err(other),
            }
        }

        Ok(report)
    }

    /// Run the ingest loop until `shutdown` resolves.
    ///
    /// Transient Telegram failures are logged and retried indefinitely; a
    /// fatal error (bad token, broken archive) stops the run.
    pub async fn run<F>(&self, shutdown: F) -> Result<RunReport>
    where
        F: std::future::Future<Output = ()>,
    {
        info!("Archiving channel @{}", self.config.chat);

        tokio::pin!(shutdown);
        let mut report = RunReport::default();

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping archiver");
                    break;
                }
                result = self.poll_once() => match result {
                    Ok(batch) => {
                        if batch.updates == 0 {
                            continue;
                        }
                        report.absorb(&batch);
                        if batch.archived > 0 {
                            let gaps = self.gap_count().await?;
                            debug!("Archive now has {} gap(s) below the high-water mark", gaps);
                        }
                    }
                    Err(ArchiverError::Telegram(err)) if err.is_transient() => {
                        let pause = retry_pause(&err);
                        warn!(
                            "Transient Telegram failure, retrying in {}s: {err}",
                            pause.as_secs()
                        );
                        tokio::select! {
                            biased;
                            _ = &mut shutdown => break,
                            _ = tokio::time::sleep(pause) => {}
                        }
                    }
                    Err(other) => return Err(other),
                }
            }
        }

        info!(
            "Archiver stopped: {} batches, {} updates, {} archived",
            report.batches, report.updates, report.archived
        );
        Ok(report)
    }
}

fn retry_pause(err: &TelegramError) -> Duration {
    match err {
        TelegramError::FloodWait { retry_after } => Duration::from_secs(*retry_after),
        _ => TRANSIENT_RETRY_PAUSE,
    }
}
