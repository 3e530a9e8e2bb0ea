// Repository of RGBA textures.
// The renderer and world logic interact through `TextureId` only.

use std::collections::HashMap;

use crate::renderer::Rgba;

/// Runtime handle for a texture in this bank.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;

/// `TextureId` whose pixels are the checkerboard fallback.
/// Always = 0 because `TextureBank::new()` inserts it first.
pub const NO_TEXTURE: TextureId = 0;

/// CPU-side storage: 32-bit **ARGB** (0xAARRGGBB) in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    pub w: usize,
    pub h: usize,
    pub pixels: Vec<Rgba>,
}

impl Texture {
    /// Two-colour checkerboard with `cell`-pixel squares.
    pub fn checker(name: impl Into<String>, size: usize, cell: usize, a: Rgba, b: Rgba) -> Self {
        let cell = cell.max(1);
        let pixels = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if ((x / cell) ^ (y / cell)) & 1 == 0 { a } else { b }
            })
            .collect();
        Self {
            name: name.into(),
            w: size,
            h: size,
            pixels,
        }
    }

    /// Solid fill with a darker one-pixel border, so tiling stays visible.
    pub fn framed(name: impl Into<String>, size: usize, fill: Rgba) -> Self {
        let border = darken(fill);
        let pixels = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if x == 0 || y == 0 { border } else { fill }
            })
            .collect();
        Self {
            name: name.into(),
            w: size,
            h: size,
            pixels,
        }
    }

    /// Texel at integer coordinates, wrapping in both directions.
    #[inline]
    pub fn texel(&self, u: i32, v: i32) -> Rgba {
        let x = u.rem_euclid(self.w as i32) as usize;
        let y = v.rem_euclid(self.h as i32) as usize;
        self.pixels[y * self.w + x]
    }
}

/// Convenience checkerboard 8×8 (dark/light grey).
impl Default for Texture {
    fn default() -> Self {
        Texture::checker("CHECKER", 8, 1, 0xFF_A0A0A0, 0xFF_505050)
    }
}

fn darken(c: Rgba) -> Rgba {
    let a = c & 0xFF00_0000;
    let rgb = (c >> 1) & 0x007F_7F7F;
    a | rgb
}

/// Things that can go wrong when using the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Attempted to insert a second texture with an existing name.
    #[error("texture name `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. bank.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    #[error("texture `{name}` has {got} pixels, expected {w}×{h}")]
    BadSize {
        name: String,
        w: usize,
        h: usize,
        got: usize,
    },
}

/// Name-indexed cache of textures.
///
/// * Stores exactly one copy of every name.
/// * ID **0** is always the “missing” checkerboard.
pub struct TextureBank {
    by_name: HashMap<String, TextureId>,
    data: Vec<Texture>,
}

impl TextureBank {
    /// Create a bank holding only the fallback texture, stored under the
    /// fixed name `"MISSING"` with handle **0**.
    pub fn new(missing_tex: Texture) -> Self {
        let mut by_name = HashMap::new();
        by_name.insert("MISSING".into(), NO_TEXTURE);
        Self {
            by_name,
            data: vec![missing_tex],
        }
    }

    pub fn default_with_checker() -> Self {
        Self::new(Texture::default())
    }

    /// A handful of generated textures for demo levels.
    pub fn procedural() -> Result<Self, TextureError> {
        let mut bank = Self::default_with_checker();
        let generated = [
            Texture::framed("STONE", 32, 0xFF_8C7B6B),
            Texture::framed("BRICK", 32, 0xFF_A0402C),
            Texture::checker("TILE", 32, 8, 0xFF_3C5A78, 0xFF_6A8CAA),
            Texture::framed("MOSS", 32, 0xFF_4E7A3A),
        ];
        for t in generated {
            let name = t.name.clone();
            bank.insert(name, t)?;
        }
        Ok(bank)
    }

    /// Number of textures stored (including the “missing” one).
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.len() == 1
    } // only checker

    /// Every id except the fallback, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = TextureId> {
        1..self.data.len() as TextureId
    }

    /// Obtain the id for a *loaded* texture by name.
    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(name).copied()
    }

    /// Fallback-safe query: unknown names resolve to the checkerboard id.
    pub fn id_or_missing(&self, name: &str) -> TextureId {
        self.id(name).unwrap_or(NO_TEXTURE)
    }

    /// Borrow a texture by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    /// Like [`texture`](Self::texture) but unknown ids resolve to the
    /// fallback.
    pub fn texture_or_missing(&self, id: TextureId) -> &Texture {
        self.data
            .get(id as usize)
            .unwrap_or(&self.data[NO_TEXTURE as usize])
    }

    /// Insert a texture under `name` and return its new id.
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        tex: Texture,
    ) -> Result<TextureId, TextureError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(TextureError::Duplicate(name));
        }
        if tex.w == 0 || tex.h == 0 || tex.pixels.len() != tex.w * tex.h {
            return Err(TextureError::BadSize {
                name,
                w: tex.w,
                h: tex.h,
                got: tex.pixels.len(),
            });
        }
        let id = self.data.len() as TextureId;
        self.data.push(tex);
        self.by_name.insert(name, id);
        Ok(id)
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
