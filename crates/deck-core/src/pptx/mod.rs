//! Office Open XML presentation writer.

mod parts;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::deck::{Deck, Slide, TITLE};
use crate::error::RenderError;
use parts::Rel;

pub use parts::{SLIDE_HEIGHT_EMU, SLIDE_WIDTH_EMU};

/// One embedded image, stored once however many cells show it.
struct MediaPart {
    name: String,
    bytes: Vec<u8>,
}

/// Media parts keyed by content hash.
#[derive(Default)]
struct MediaStore {
    parts: Vec<MediaPart>,
    by_hash: HashMap<String, usize>,
}

impl MediaStore {
    /// Returns the part name (`imageN.ext`) for the source image.
    fn add(&mut self, path: &Path) -> Result<String, RenderError> {
        let source = fs::read(path).map_err(|source| RenderError::Io { path: path.to_path_buf(), source })?;
        let hash = hex::encode(Sha256::digest(&source));
        if let Some(&idx) = self.by_hash.get(&hash) {
            return Ok(self.parts[idx].name.clone());
        }

        let (ext, bytes) = embeddable(path, source)?;
        let name = format!("image{}.{}", self.parts.len() + 1, ext);
        self.by_hash.insert(hash, self.parts.len());
        self.parts.push(MediaPart { name: name.clone(), bytes });
        Ok(name)
    }

    /// (extension, content type) for every media extension in use.
    fn content_types(&self) -> Vec<(String, String)> {
        let mut exts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| p.name.rsplit_once('.').map(|(_, ext)| ext))
            .collect();
        exts.sort_unstable();
        exts.dedup();
        exts.into_iter()
            .map(|ext| {
                let mime = mime_guess::from_ext(ext).first_raw().unwrap_or("application/octet-stream");
                (ext.to_string(), mime.to_string())
            })
            .collect()
    }
}

/// Media extension for formats PowerPoint shows as-is.
pub fn embedded_extension(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpeg"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::Bmp => Some("bmp"),
        ImageFormat::Tiff => Some("tiff"),
        _ => None,
    }
}

/// Keep formats PowerPoint can show as-is; re-encode anything else to PNG.
fn embeddable(path: &Path, bytes: Vec<u8>) -> Result<(&'static str, Vec<u8>), RenderError> {
    let image_err = |source| RenderError::Image { path: path.to_path_buf(), source };
    let format = image::guess_format(&bytes).map_err(image_err)?;
    if let Some(ext) = embedded_extension(format) {
        return Ok((ext, bytes));
    }

    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(image_err)?;
    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(image_err)?;
    Ok(("png", png))
}

struct Package<W: Write + std::io::Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    path: PathBuf,
}

impl<W: Write + std::io::Seek> Package<W> {
    fn part(&mut self, name: &str, bytes: &[u8]) -> Result<(), RenderError> {
        self.zip.start_file(name, self.options)?;
        self.zip
            .write_all(bytes)
            .map_err(|source| RenderError::Io { path: self.path.clone(), source })
    }
}

/// Serialize the deck to `output` and return its path.
pub fn write_pptx(deck: &Deck, output: &Path) -> Result<PathBuf, RenderError> {
    let io_err = |source| RenderError::Io { path: output.to_path_buf(), source };

    // Resolve media first so an unreadable image fails before anything is written
    let mut media = MediaStore::default();
    let mut slide_media: Vec<Vec<String>> = Vec::with_capacity(deck.slides.len());
    for slide in &deck.slides {
        let names = match slide {
            Slide::Grid { cells, .. } => cells
                .iter()
                .map(|cell| media.add(&cell.image.path))
                .collect::<Result<Vec<_>, _>>()?,
            Slide::Title { .. } => Vec::new(),
        };
        slide_media.push(names);
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(output).map_err(io_err)?;
    let mut pkg = Package {
        zip: ZipWriter::new(BufWriter::new(file)),
        options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        path: output.to_path_buf(),
    };

    let slide_count = deck.slides.len();
    pkg.part("[Content_Types].xml", parts::content_types(&media.content_types(), slide_count)?.as_bytes())?;
    pkg.part(
        "_rels/.rels",
        parts::relationships(&[
            Rel::new("rId1", "officeDocument", "ppt/presentation.xml"),
            Rel::new("rId2", "metadata/core-properties", "docProps/core.xml"),
            Rel::new("rId3", "extended-properties", "docProps/app.xml"),
        ])?
        .as_bytes(),
    )?;
    pkg.part("docProps/core.xml", parts::core_properties(TITLE)?.as_bytes())?;
    pkg.part("docProps/app.xml", parts::app_properties(slide_count)?.as_bytes())?;

    let mut presentation_rels = vec![
        Rel::new("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        Rel::new("rId2", "theme", "theme/theme1.xml"),
    ];
    for n in 1..=slide_count {
        presentation_rels.push(Rel::new(format!("rId{}", n + 2), "slide", format!("slides/slide{}.xml", n)));
    }
    pkg.part("ppt/presentation.xml", parts::presentation(slide_count)?.as_bytes())?;
    pkg.part("ppt/_rels/presentation.xml.rels", parts::relationships(&presentation_rels)?.as_bytes())?;

    pkg.part("ppt/slideMasters/slideMaster1.xml", parts::slide_master()?.as_bytes())?;
    pkg.part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        parts::relationships(&[
            Rel::new("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            Rel::new("rId2", "theme", "../theme/theme1.xml"),
        ])?
        .as_bytes(),
    )?;
    pkg.part("ppt/slideLayouts/slideLayout1.xml", parts::blank_layout()?.as_bytes())?;
    pkg.part(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        parts::relationships(&[Rel::new("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")])?.as_bytes(),
    )?;
    pkg.part("ppt/theme/theme1.xml", parts::theme()?.as_bytes())?;

    for (i, (slide, names)) in deck.slides.iter().zip(&slide_media).enumerate() {
        let n = i + 1;
        let mut rels = vec![Rel::new("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")];
        let mut image_rels = Vec::with_capacity(names.len());
        for (k, name) in names.iter().enumerate() {
            let id = format!("rId{}", k + 2);
            rels.push(Rel::new(id.clone(), "image", format!("../media/{}", name)));
            image_rels.push(id);
        }
        pkg.part(&format!("ppt/slides/slide{}.xml", n), parts::slide(slide, &image_rels)?.as_bytes())?;
        pkg.part(&format!("ppt/slides/_rels/slide{}.xml.rels", n), parts::relationships(&rels)?.as_bytes())?;
    }

    for part in &media.parts {
        pkg.part(&format!("ppt/media/{}", part.name), &part.bytes)?;
    }

    let mut writer = pkg.zip.finish()?;
    writer.flush().map_err(io_err)?;
    tracing::info!(
        path = %output.display(),
        slides = slide_count,
        media = media.parts.len(),
        "presentation written"
    );
    Ok(output.to_path_buf())
}
