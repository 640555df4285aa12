use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use blomp::{codec::estimated_size, Block, Image};
use image::ColorType;
use text_io::read;

#[derive(Debug, Clone, Copy)]
pub enum Assume {
    Yes,
    No,
}

pub fn exists_decision<P: AsRef<Path>>(place: &str, action: &str, path: &P, assume: Option<Assume>) -> bool {
    let path = path.as_ref();

    match assume {
        Some(Assume::Yes) => return true,
        Some(Assume::No) => return false,
        None => (),
    }

    loop {
        print!("{place} file {path:?} already exists. {action}? [y/N] ");

        let opt: String = read!("{}\n");
        let opt = opt.trim().to_lowercase();

        if opt.is_empty() || opt == "n" {
            return false
        } else if opt == "y" {
            return true
        }
    }
}

/// Whether `path` may be written to, asking the user if it already exists.
pub fn may_write<P: AsRef<Path>>(path: &P, assume: Option<Assume>) -> Result<bool> {
    let path = path.as_ref();

    Ok(!path.try_exists()? || exists_decision("Output", "Overwrite", &path, assume))
}

pub fn is_blomp_file<P: AsRef<Path>>(path: &P) -> bool {
    path.as_ref()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("blp"))
}

/// `input` with its extension replaced by `suffix`, so `photo.png` and
/// `_HEAT.png` become `photo_HEAT.png`.
pub fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or(OsStr::new("out"));

    let mut name = stem.to_os_string();
    name.push(suffix);
    input.with_file_name(name)
}

/// Resolve an optional output argument, where `+` stands for a name
/// derived from the input file.
pub fn optional_path(arg: Option<&Path>, input: &Path, suffix: &str) -> Option<PathBuf> {
    arg.map(|path| {
        if path.as_os_str() == "+" {
            derived_path(input, suffix)
        } else {
            path.to_path_buf()
        }
    })
}

/// Load an image in any format supported by `image`, or render a `.blp`
/// file.
pub fn load_image(path: &Path) -> Result<Image> {
    if is_blomp_file(&path) {
        let picture = blomp::open(path).with_context(|| format!("Could not read {path:?}"))?;
        return Ok(picture.to_image()?);
    }

    let rgb = image::open(path)
        .with_context(|| format!("Could not read {path:?}"))?
        .into_rgb8();

    Image::from_rgb8(rgb.width(), rgb.height(), rgb.as_raw()).context("Image buffer has the wrong size")
}

pub fn save_image(img: &Image, path: &Path) -> Result<()> {
    image::save_buffer(path, &img.to_rgb8(), img.width(), img.height(), ColorType::Rgb8)
        .with_context(|| format!("Could not write {path:?}"))?;

    Ok(())
}

pub fn print_tree_info(tree: &Block, name: &Path) {
    println!("Block tree info for {name:?}:");
    println!("  Blocks:         {}", tree.node_count());
    println!("  Color blocks:   {}", tree.leaf_count());
    println!("  Estimated size: {} bytes", estimated_size(tree));
}
