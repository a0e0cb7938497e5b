//! Scripted browser controller for integration tests.
//!
//! Answers per absolute URL, records every call, and tracks how many captures
//! are running at once.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use image::{ImageBuffer, ImageFormat, Rgb};
use screener_core::browser::{BrowserController, BrowserError, BrowserErrorKind, CaptureOptions, PageCapture};

#[derive(Debug, Clone)]
pub enum Scripted {
    /// Renders `image`, optionally landing somewhere else.
    Page {
        landing: Option<String>,
        status: u16,
        image: Vec<u8>,
    },
    Fail(BrowserErrorKind, String),
    Panic,
}

pub struct FakeBrowser {
    script: HashMap<String, Scripted>,
    fallback: Scripted,
    latency: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeBrowser {
    /// Unscripted URLs fail with an unclassified error.
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            fallback: Scripted::Fail(BrowserErrorKind::Unknown, "unscripted".into()),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn on(mut self, url: &str, answer: Scripted) -> Self {
        self.script.insert(url.to_string(), answer);
        self
    }

    pub fn otherwise(mut self, answer: Scripted) -> Self {
        self.fallback = answer;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl BrowserController for FakeBrowser {
    fn capture(&self, url: &str, _options: &CaptureOptions) -> Result<PageCapture, BrowserError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        let answer = self.script.get(url).cloned().unwrap_or_else(|| self.fallback.clone());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match answer {
            Scripted::Page { landing, status, image } => Ok(PageCapture {
                landing_url: landing.unwrap_or_else(|| url.to_string()),
                status_code: status,
                image,
            }),
            Scripted::Fail(kind, message) => Err(BrowserError::new(kind, message)),
            Scripted::Panic => panic!("browser crashed on {url}"),
        }
    }
}

pub fn page(image: Vec<u8>) -> Scripted {
    Scripted::Page {
        landing: None,
        status: 200,
        image,
    }
}

pub fn redirect(landing: &str, image: Vec<u8>) -> Scripted {
    Scripted::Page {
        landing: Some(landing.to_string()),
        status: 200,
        image,
    }
}

pub fn fail(kind: BrowserErrorKind, message: &str) -> Scripted {
    Scripted::Fail(kind, message.to_string())
}

/// PNG fading left to right. Every seed gives different bytes but the same
/// picture to a perceptual hash.
pub fn fading(seed: u32) -> Vec<u8> {
    encode(|x, y| {
        let v = (250 - 2 * x - (seed + y) % 8) as u8;
        Rgb([v, v, v])
    })
}

/// PNG brightening left to right; perceptually the opposite of [`fading`].
pub fn rising(seed: u32) -> Vec<u8> {
    encode(|x, y| {
        let v = (2 * x + (seed + y) % 8) as u8;
        Rgb([v, v / 2, 255 - v])
    })
}

fn encode(f: impl Fn(u32, u32) -> Rgb<u8>) -> Vec<u8> {
    let img = ImageBuffer::from_fn(120, 80, f);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
