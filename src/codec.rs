use crate::constants::{LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, ZOPFLI_ITERATIONS};
use crate::error::{CompressionError, Result};
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use mozjpeg::{ColorSpace, Compress, ScanMode};
use oxipng::{Deflaters, Options as OxipngOptions, StripChunks};
use std::fs;
use std::io::Cursor;
use std::num::NonZeroU8;
use std::path::Path;

/// Shape of a decoded source image, read before any encode decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub has_alpha: bool,
}

/// One complete PNG encoding parameter set (one strategy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngParams {
    /// Deflate effort 0-9, independent from perceptual quality.
    pub compression_level: u8,
    pub palette: bool,
    /// Palette ceiling; `None` keeps the quantizer default.
    pub max_colors: Option<u32>,
    pub dithering: bool,
    pub quality: u8,
    pub max_effort: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeParams {
    Jpeg { quality: u8, progressive: bool },
    Png(PngParams),
    WebP { quality: u8, effort_boost: bool },
    /// Re-encode with the source format's own defaults (tiff/bmp inputs).
    Original,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    /// Aspect-preserving fit-inside target; never upscales.
    pub resize: Option<(u32, u32)>,
    pub params: EncodeParams,
}

/// Capability boundary around the native image libraries. Everything that
/// touches pixels goes through here; the decision pipeline above it only
/// ever sees paths, parameter sets and byte buffers.
pub trait Codec: Sync {
    fn decode_metadata(&self, path: &Path) -> Result<ImageMetadata>;
    fn encode(&self, source: &Path, request: &EncodeRequest) -> Result<Vec<u8>>;
    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

/// Production codec backed by image / mozjpeg / imagequant / oxipng / webp.
#[derive(Debug, Default)]
pub struct NativeCodec;

impl NativeCodec {
    pub fn new() -> Self {
        NativeCodec
    }
}

impl Codec for NativeCodec {
    fn decode_metadata(&self, path: &Path) -> Result<ImageMetadata> {
        let img = ImageReader::open(path)?.decode()?;
        let color = img.color();
        Ok(ImageMetadata {
            width: img.width(),
            height: img.height(),
            channels: color.channel_count(),
            has_alpha: color.has_alpha(),
        })
    }

    fn encode(&self, source: &Path, request: &EncodeRequest) -> Result<Vec<u8>> {
        let img = ImageReader::open(source)?.decode()?;
        let img = apply_resize(img, request.resize);

        match &request.params {
            EncodeParams::Jpeg {
                quality,
                progressive,
            } => encode_jpeg(&img, *quality, *progressive),
            EncodeParams::Png(params) => encode_png(&img, params),
            EncodeParams::WebP {
                quality,
                effort_boost,
            } => encode_webp(&img, *quality, *effort_boost),
            EncodeParams::Original => encode_original(&img, source),
        }
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|_| CompressionError::DirectoryCreationFailed(parent.to_path_buf()))?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

fn apply_resize(img: DynamicImage, resize: Option<(u32, u32)>) -> DynamicImage {
    match resize {
        Some((width, height)) if img.width() > width || img.height() > height => {
            img.resize(width, height, FilterType::Lanczos3)
        }
        _ => img,
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8, progressive: bool) -> Result<Vec<u8>> {
    let rgb = img.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(width, height);
    comp.set_quality(quality as f32);
    comp.set_optimize_coding(true);
    if progressive {
        comp.set_progressive_mode();
        comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);
    }

    let mut dest = Vec::new();
    let mut started = comp
        .start_compress(&mut dest)
        .map_err(|e| CompressionError::JpegEncoding(e.to_string()))?;
    started
        .write_scanlines(rgb.as_raw())
        .map_err(|e| CompressionError::JpegEncoding(e.to_string()))?;
    started
        .finish()
        .map_err(|e| CompressionError::JpegEncoding(e.to_string()))?;

    Ok(dest)
}

fn encode_png(img: &DynamicImage, params: &PngParams) -> Result<Vec<u8>> {
    let img = if params.palette {
        quantize_palette(img, params)?
    } else {
        img.clone()
    };

    let mut png_buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut png_buf),
        compression_type(params.compression_level),
        PngFilterType::Adaptive,
    );
    img.write_with_encoder(encoder)?;

    let opts = deflate_options(params);
    oxipng::optimize_from_memory(&png_buf, &opts)
        .map_err(|e| CompressionError::PngOptimization(e.to_string()))
}

fn compression_type(level: u8) -> CompressionType {
    match level {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

fn deflate_options(params: &PngParams) -> OxipngOptions {
    let mut opts = if params.max_effort {
        OxipngOptions::from_preset(6)
    } else {
        OxipngOptions::from_preset(4)
    };
    opts.strip = StripChunks::Safe;
    opts.deflate = if params.max_effort {
        Deflaters::Zopfli {
            iterations: NonZeroU8::new(ZOPFLI_ITERATIONS).unwrap(),
        }
    } else if params.compression_level >= 7 {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_HIGH_LEVEL,
        }
    } else {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_LOW_LEVEL,
        }
    };
    opts
}

fn quantize_palette(img: &DynamicImage, params: &PngParams) -> Result<DynamicImage> {
    let quant_err = |e: imagequant::Error| CompressionError::Quantization(e.to_string());

    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    let (w, h) = (width as usize, height as usize);

    let mut attr = imagequant::Attributes::new();
    attr.set_speed(if params.max_effort { 1 } else { 3 })
        .map_err(quant_err)?;
    if let Some(colors) = params.max_colors {
        attr.set_max_colors(colors).map_err(quant_err)?;
    }
    attr.set_quality(0, params.quality).map_err(quant_err)?;

    let pixels: Vec<rgb::RGBA<u8>> = rgba
        .chunks_exact(4)
        .map(|c| rgb::RGBA::new(c[0], c[1], c[2], c[3]))
        .collect();

    let mut liq_img =
        imagequant::Image::new(&attr, pixels.as_slice(), w, h, 0.0).map_err(quant_err)?;
    let mut quantized = attr.quantize(&mut liq_img).map_err(quant_err)?;
    quantized
        .set_dithering_level(if params.dithering { 1.0 } else { 0.0 })
        .map_err(quant_err)?;

    let (palette, indexed) = quantized.remapped(&mut liq_img).map_err(quant_err)?;

    let mut expanded = Vec::with_capacity(w * h * 4);
    for idx in &indexed {
        let p = palette[*idx as usize];
        expanded.extend_from_slice(&[p.r, p.g, p.b, p.a]);
    }

    let buf = image::RgbaImage::from_raw(width, height, expanded).ok_or_else(|| {
        CompressionError::Quantization("palette remap produced a short pixel buffer".to_string())
    })?;
    Ok(DynamicImage::ImageRgba8(buf))
}

fn encode_webp(img: &DynamicImage, quality: u8, effort_boost: bool) -> Result<Vec<u8>> {
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());

    if effort_boost {
        let mut config = webp::WebPConfig::new()
            .map_err(|_| CompressionError::WebPEncoding("config initialization failed".to_string()))?;
        config.quality = quality as f32;
        config.method = 6;
        config.use_sharp_yuv = 1;
        let mem = encoder
            .encode_advanced(&config)
            .map_err(|e| CompressionError::WebPEncoding(format!("{:?}", e)))?;
        Ok(mem.to_vec())
    } else {
        Ok(encoder.encode(quality as f32).to_vec())
    }
}

fn encode_original(img: &DynamicImage, source: &Path) -> Result<Vec<u8>> {
    let format = ImageFormat::from_path(source)?;
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, format)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Which branch of the pipeline an `EncodeRequest` belongs to, derived
    /// from its parameter set. Lets scripted tests answer per attempt.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum AttemptKind {
        StandardPng,
        AggressivePng,
        UltraPng,
        Jpeg,
        WebP,
        Original,
    }

    pub fn classify(request: &EncodeRequest) -> AttemptKind {
        match &request.params {
            EncodeParams::Jpeg { .. } => AttemptKind::Jpeg,
            EncodeParams::WebP { .. } => AttemptKind::WebP,
            EncodeParams::Original => AttemptKind::Original,
            EncodeParams::Png(p) if !p.max_effort => AttemptKind::StandardPng,
            EncodeParams::Png(p) => match p.max_colors {
                Some(crate::constants::ULTRA_ALPHA_MAX_COLORS)
                | Some(crate::constants::ULTRA_OPAQUE_MAX_COLORS) => AttemptKind::UltraPng,
                _ => AttemptKind::AggressivePng,
            },
        }
    }

    /// In-memory codec double: encodes according to a scripted closure,
    /// records every request, and captures written files.
    pub struct FakeCodec {
        metadata: ImageMetadata,
        script: Box<dyn Fn(&EncodeRequest) -> Result<Vec<u8>> + Send + Sync>,
        pub requests: Mutex<Vec<EncodeRequest>>,
        pub written: Mutex<HashMap<PathBuf, Vec<u8>>>,
    }

    impl FakeCodec {
        pub fn new(
            metadata: ImageMetadata,
            script: impl Fn(&EncodeRequest) -> Result<Vec<u8>> + Send + Sync + 'static,
        ) -> Self {
            FakeCodec {
                metadata,
                script: Box::new(script),
                requests: Mutex::new(Vec::new()),
                written: Mutex::new(HashMap::new()),
            }
        }

        pub fn attempts(&self) -> Vec<AttemptKind> {
            self.requests.lock().unwrap().iter().map(classify).collect()
        }
    }

    pub fn rgb_metadata() -> ImageMetadata {
        ImageMetadata {
            width: 640,
            height: 480,
            channels: 3,
            has_alpha: false,
        }
    }

    pub fn rgba_metadata() -> ImageMetadata {
        ImageMetadata {
            width: 640,
            height: 480,
            channels: 4,
            has_alpha: true,
        }
    }

    pub fn buffer(len: usize) -> Vec<u8> {
        vec![0x42; len]
    }

    impl Codec for FakeCodec {
        fn decode_metadata(&self, _path: &Path) -> Result<ImageMetadata> {
            Ok(self.metadata.clone())
        }

        fn encode(&self, _source: &Path, request: &EncodeRequest) -> Result<Vec<u8>> {
            self.requests.lock().unwrap().push(request.clone());
            (self.script)(request)
        }

        fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
            self.written
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), bytes.to_vec());
            Ok(())
        }
    }
}
