//! Browser callbacks folded into one page summary.

/// Everything the Chrome controller learns about a page, sent over one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    /// The tab settled on this URL.
    Navigated { url: String },
    /// A network response arrived.
    Response { url: String, status: u16 },
    /// Rendering finished and the screenshot was taken.
    LoadFinished,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSummary {
    pub landing_url: Option<String>,
    /// 0 when no response was seen.
    pub status_code: u16,
    pub loaded: bool,
}

/// Reduces an event stream to the landing URL and its status code.
///
/// The status is taken from the response for the landing URL when there is
/// one, otherwise from the first response (redirect hops report none).
pub fn fold_events<I>(events: I) -> PageSummary
where
    I: IntoIterator<Item = BrowserEvent>,
{
    let mut summary = PageSummary::default();
    let mut responses: Vec<(String, u16)> = Vec::new();
    for event in events {
        match event {
            BrowserEvent::Navigated { url } => summary.landing_url = Some(url),
            BrowserEvent::Response { url, status } => responses.push((url, status)),
            BrowserEvent::LoadFinished => summary.loaded = true,
        }
    }

    let for_landing = summary
        .landing_url
        .as_deref()
        .and_then(|landing| responses.iter().rev().find(|(url, _)| url == landing));
    summary.status_code = for_landing
        .or_else(|| responses.first())
        .map(|(_, status)| *status)
        .unwrap_or(0);
    summary
}
