//! # blockcodec - Block-Transform Lossy Image Codec
//!
//! blockcodec runs an RGB image through the classic JPEG-style lossy
//! pipeline, stopping short of entropy coding:
//!
//! 1. YCbCr color transform
//! 2. Chroma subsampling (4:4:4, 4:2:2, 4:2:0)
//! 3. Tiling into `N×N` blocks
//! 4. Per-block DCT
//! 5. Quantization, either with one quality-scaled matrix or with a matrix
//!    per block chosen from a saliency map
//! 6. Zigzag reordering
//!
//! Decoding mirrors each stage. Both directions can stop at any stage so
//! intermediate representations can be inspected or snapshotted.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blockcodec::{CodecConfig, Image, Stage};
//!
//! let config = CodecConfig::new().quality(60.0).subsampling("4:2:0");
//! let mut image = Image::from_rgb_bytes(&pixels, width, height, config)?;
//!
//! image.encode()?;
//! let coefficients = image.channel(0);
//!
//! image.decode_from(Stage::Zigzag)?;
//! let reconstructed = image.raster();
//! ```
//!
//! ## Dynamic quantization
//!
//! With `.dynamic(true)` and a [`SaliencyMap`], each block quantizes at its
//! own quality inside a working range around the base quality. Salient
//! blocks keep more detail.

// Core modules
pub mod consts;
mod error;
mod types;

// Stage operations
pub mod block;
pub mod color;
pub mod dct;
pub mod quant;
pub mod sample;
pub mod zigzag;

// Adaptive quantization
pub mod adaptive_quant;

// Pipeline
mod config;
mod pipeline;
mod snapshot;

// Public API
pub use adaptive_quant::SaliencyMap;
pub use block::{BlockGrid, Plane};
pub use config::CodecConfig;
pub use error::{Error, Result};
pub use pipeline::{ChannelData, Image, Stage};
pub use quant::{QuantMatrix, QuantPlan};
pub use snapshot::{ChannelRecord, Snapshot, SNAPSHOT_VERSION};
pub use types::{CoeffDepth, OverflowPolicy, RangePolicy, Subsampling, ZeroDivisorPolicy};
pub use zigzag::ZigzagOrder;
