//! Logo images as PDF image XObjects

use crate::stream::flate_stream;
use crate::types::Result;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

/// A decoded raster ready to be embedded
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    rgb: Vec<u8>,
    /// Present only when some pixel is not fully opaque
    alpha: Option<Vec<u8>>,
}

impl RasterImage {
    /// Decode a PNG or JPEG file into 8-bit RGB samples plus optional alpha
    pub fn open(path: &Path) -> Result<Self> {
        let decoded = image::open(path)?.to_rgba8();
        let (width, height) = decoded.dimensions();

        let pixel_count = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in decoded.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }

        let translucent = alpha.iter().any(|a| *a < u8::MAX);
        Ok(Self {
            width,
            height,
            rgb,
            alpha: translucent.then_some(alpha),
        })
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Add the image (and its soft mask) to a document
    pub(crate) fn embed(&self, doc: &mut Document) -> Result<ObjectId> {
        let mut image_dict = self.sample_dict("DeviceRGB");

        if let Some(alpha) = &self.alpha {
            let mask = flate_stream(self.sample_dict("DeviceGray"), alpha)?;
            let mask_id = doc.add_object(mask);
            image_dict.set("SMask", Object::Reference(mask_id));
        }

        Ok(doc.add_object(flate_stream(image_dict, &self.rgb)?))
    }

    fn sample_dict(&self, color_space: &str) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(i64::from(self.width))),
            ("Height", Object::Integer(i64::from(self.height))),
            ("ColorSpace", Object::Name(color_space.as_bytes().to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
        ])
    }
}
