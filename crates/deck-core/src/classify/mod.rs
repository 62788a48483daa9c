pub mod openai;

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;

use crate::category::Category;
use crate::error::ClassificationFailure;

pub use openai::{OpenAiConfig, OpenAiVision};

pub const CLASSIFICATION_PROMPT: &str = "\
Please classify this dental photograph into exactly one of these categories:
1. Front view with teeth visible: the face is seen straight on and the teeth are showing (smiling or lips parted).
2. Front view without teeth visible: the face is seen straight on with the lips closed so no teeth are showing.
3. Side view of jaw: the head is turned to profile, showing the jaw line from the side.
4. Intra-oral view: the photograph is taken inside the mouth, framing teeth and gums without the full face.

Respond with just the category number, a single digit from 1 to 4.";

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// An image inlined for upload as a `data:` URL.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub mime: &'static str,
    pub base64: String,
}

impl EncodedImage {
    pub fn from_path(path: &Path) -> Result<Self, ClassificationFailure> {
        let bytes = fs::read(path)?;
        let mime = mime_guess::from_path(path).first_raw().unwrap_or("image/jpeg");
        Ok(Self { mime, base64: STANDARD.encode(bytes) })
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// A vision-capable model that answers a prompt about one image.
pub trait VisionModel {
    fn complete(&self, prompt: &str, image: &EncodedImage) -> Result<String, ClassificationFailure>;
}

/// Pull the category out of a free-text reply: first run of digits, 1-4.
pub fn parse_reply(reply: &str) -> Result<Category, ClassificationFailure> {
    let digits = DIGITS
        .find(reply)
        .ok_or_else(|| ClassificationFailure::NoDigit(reply.to_string()))?;
    // A run too long for u64 is out of range all the same
    let code = digits.as_str().parse::<u64>().unwrap_or(u64::MAX);
    Category::from_code(code).ok_or(ClassificationFailure::OutOfRange(code))
}

pub struct Classifier<M> {
    model: M,
}

impl<M: VisionModel> Classifier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Single attempt, no retry.
    pub fn try_classify(&self, path: &Path) -> Result<Category, ClassificationFailure> {
        let image = EncodedImage::from_path(path)?;
        let reply = self.model.complete(CLASSIFICATION_PROMPT, &image)?;
        tracing::debug!(path = %path.display(), reply = %reply, "model reply");
        parse_reply(&reply)
    }

    /// Like `try_classify`, but any failure lands in `Unknown`.
    pub fn classify(&self, path: &Path) -> Category {
        match self.try_classify(path) {
            Ok(category) => category,
            Err(e) => {
                tracing::warn!(path = %path.display(), "classification failed, using unknown: {}", e);
                Category::Unknown
            }
        }
    }
}
