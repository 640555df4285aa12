use crate::pixel::Pixel;

/// An in-memory RGB image with floating point pixels, stored row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl Image {
    /// Create a black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Pixel::BLACK)
    }

    pub fn filled(width: u32, height: u32, color: Pixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Wrap an existing row-major pixel buffer. Returns `None` if the buffer
    /// length does not match the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Pixel>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }

        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build an image from packed 8-bit RGB triples.
    pub fn from_rgb8(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        let pixels = bytes
            .chunks_exact(3)
            .map(|p| Pixel::from_bytes([p[0], p[1], p[2]]))
            .collect();

        Self::from_pixels(width, height, pixels)
    }

    /// Quantize the image into packed 8-bit RGB triples.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_bytes()).collect()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// # Panics
    /// Panics if `(x, y)` lies outside the image.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Pixel {
        self.pixels[self.index(x, y)]
    }

    /// # Panics
    /// Panics if `(x, y)` lies outside the image.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Pixel) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside of {}x{} image",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }
}
