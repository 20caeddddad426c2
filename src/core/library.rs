//! Purpose: In-memory library of unique book titles with validated mutations.
//! Exports: `Library`, `LibraryObserver`, `TracingObserver`.
//! Role: Owned, injectable service instance; the HTTP layer only translates results.
//! Invariants: Titles are unique by exact, case-sensitive match.
//! Invariants: Order is insertion order; rename replaces in place.
//! Invariants: Listing and saving operate on a snapshot taken when the call starts.
//! Notes: The mutex is never held across an await point.
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;
use tokio::time::Instant;

use super::error::{Error, ErrorKind};
use super::latency::Latency;

/// Receives progress from the staged listing and the simulated save.
///
/// An observer error aborts the operation and surfaces as `ErrorKind::Internal`.
pub trait LibraryObserver: Send + Sync {
    fn book_listed(&self, title: &str) -> Result<(), Error>;

    fn book_saved(&self, title: &str, elapsed_ms: u64) -> Result<(), Error>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl LibraryObserver for TracingObserver {
    fn book_listed(&self, title: &str) -> Result<(), Error> {
        tracing::debug!(title, "listed book");
        Ok(())
    }

    fn book_saved(&self, title: &str, elapsed_ms: u64) -> Result<(), Error> {
        tracing::debug!(title, elapsed_ms, "saved book");
        Ok(())
    }
}

#[derive(Clone)]
pub struct Library {
    titles: Arc<Mutex<Vec<String>>>,
    latency: Latency,
    observer: Arc<dyn LibraryObserver>,
}

impl Default for Library {
    fn default() -> Self {
        Self::new(Latency::default())
    }
}

impl Library {
    pub fn new(latency: Latency) -> Self {
        Self {
            titles: Arc::new(Mutex::new(Vec::new())),
            latency,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: impl LibraryObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Seeds titles, skipping empty strings and keeping the first of any duplicates.
    pub fn with_titles<I, S>(self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut guard = self.titles.lock().unwrap_or_else(|poison| poison.into_inner());
            for title in titles {
                let title = title.into();
                if !title.is_empty() && !guard.contains(&title) {
                    guard.push(title);
                }
            }
        }
        self
    }

    pub fn titles(&self) -> Result<Vec<String>, Error> {
        Ok(self.lock()?.clone())
    }

    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.lock()?.is_empty())
    }

    /// `title` is `None` when the request field was absent or not a string.
    pub fn add_book(&self, title: Option<&str>) -> Result<(), Error> {
        let title = valid_title(title).ok_or_else(Error::invalid_title)?;
        let mut titles = self.lock()?;
        if titles.iter().any(|existing| existing == title) {
            return Err(Error::duplicate_title());
        }
        titles.push(title.to_string());
        tracing::info!(title, count = titles.len(), "added book");
        Ok(())
    }

    pub fn remove_book(&self, title: Option<&str>) -> Result<(), Error> {
        let title = valid_title(title).ok_or_else(Error::invalid_title)?;
        let mut titles = self.lock()?;
        let index = position(&titles, title).ok_or_else(Error::book_not_found)?;
        titles.remove(index);
        tracing::info!(title, count = titles.len(), "removed book");
        Ok(())
    }

    pub fn rename_book(&self, original: Option<&str>, new: Option<&str>) -> Result<(), Error> {
        let (Some(original), Some(new)) = (valid_title(original), valid_title(new)) else {
            return Err(Error::invalid_titles());
        };
        let mut titles = self.lock()?;
        let index = position(&titles, original).ok_or_else(Error::book_not_found)?;
        // Renaming a title onto itself counts as a duplicate.
        if position(&titles, new).is_some() {
            return Err(Error::duplicate_title());
        }
        titles[index] = new.to_string();
        tracing::info!(original, new, index, "renamed book");
        Ok(())
    }

    /// Walks the titles one step at a time and returns them joined by `", "`.
    pub async fn list_books(&self) -> Result<String, Error> {
        let titles = self.titles()?;
        for title in &titles {
            if !self.latency.list_step.is_zero() {
                tokio::time::sleep(self.latency.list_step).await;
            }
            self.observer.book_listed(title).map_err(internal)?;
        }
        Ok(titles.join(", "))
    }

    /// Simulates persisting every title concurrently and reports each elapsed time.
    pub async fn save_to_database(&self) -> Result<BTreeMap<String, u64>, Error> {
        let titles = self.titles()?;
        let mut tasks = JoinSet::new();
        for title in titles {
            let delay = self.latency.save_delay(&title)?;
            let observer = Arc::clone(&self.observer);
            tasks.spawn(async move {
                let started = Instant::now();
                tokio::time::sleep(delay).await;
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                observer.book_saved(&title, elapsed_ms).map_err(internal)?;
                Ok::<_, Error>((title, elapsed_ms))
            });
        }

        let mut saved = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (title, elapsed_ms) = joined.map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("save task failed")
                    .with_source(err)
            })??;
            saved.insert(title, elapsed_ms);
        }
        tracing::info!(count = saved.len(), "simulated save finished");
        Ok(saved)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<String>>, Error> {
        self.titles
            .lock()
            .map_err(|_| Error::new(ErrorKind::Internal).with_message("library state is poisoned"))
    }
}

fn valid_title(title: Option<&str>) -> Option<&str> {
    title.filter(|title| !title.is_empty())
}

fn position(titles: &[String], title: &str) -> Option<usize> {
    titles.iter().position(|existing| existing == title)
}

fn internal(err: Error) -> Error {
    if err.kind() == ErrorKind::Internal {
        return err;
    }
    let message = err.message().unwrap_or("observer failed").to_string();
    Error::new(ErrorKind::Internal)
        .with_message(message)
        .with_source(err)
}
