//! Texture loading for the decal handler

use crate::atlas::{ScarAtlas, ATLAS_SIZE};
use crate::bitmap::BitmapSource;
use crate::error::AssetError;
use crate::manifest::ResourceManifest;
use groundmark_core::error::{DecalError, ResourceKind};
use groundmark_core::interfaces::{DecalTextureLoader, TextureHandle};
use tracing::{debug, error};

/// Moves RGBA pixels onto the GPU.
pub trait TextureUploader {
    fn upload_rgba(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        mipmaps: bool,
    ) -> Result<TextureHandle, AssetError>;
}

/// Resolves decal texture names through a manifest, a bitmap source and an
/// uploader.
pub struct AssetTextureLoader<S, U> {
    manifest: ResourceManifest,
    bitmaps: S,
    uploader: U,
}

impl<S: BitmapSource, U: TextureUploader> AssetTextureLoader<S, U> {
    pub fn new(manifest: ResourceManifest, bitmaps: S, uploader: U) -> Self {
        Self {
            manifest,
            bitmaps,
            uploader,
        }
    }

    pub fn manifest(&self) -> &ResourceManifest {
        &self.manifest
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn uploader_mut(&mut self) -> &mut U {
        &mut self.uploader
    }

    fn upload_bitmap(&mut self, path: &str) -> Result<TextureHandle, AssetError> {
        let bitmap = self.bitmaps.load(path)?;
        self.uploader
            .upload_rgba(path, bitmap.width(), bitmap.height(), bitmap.pixels(), true)
    }
}

impl<S: BitmapSource, U: TextureUploader> DecalTextureLoader for AssetTextureLoader<S, U> {
    fn load_object_decal_texture(&mut self, name: &str) -> Result<TextureHandle, DecalError> {
        let path = self.manifest.object_decal_path(name);
        match self.upload_bitmap(&path) {
            Ok(handle) => {
                debug!(path = %path, ?handle, "object decal texture loaded");
                Ok(handle)
            }
            Err(err) => {
                error!(path = %path, error = %err, "could not load object decal texture");
                Err(DecalError::resource(ResourceKind::ObjectDecalTexture, path, err))
            }
        }
    }

    fn load_scar_atlas(&mut self) -> Result<TextureHandle, DecalError> {
        let atlas = ScarAtlas::compose(&self.manifest, &mut self.bitmaps);
        if atlas.tiles_loaded() == 0 {
            return Err(DecalError::resource(
                ResourceKind::ScarAtlas,
                "scars",
                "no scar bitmaps could be loaded",
            ));
        }

        self.uploader
            .upload_rgba("scar atlas", ATLAS_SIZE, ATLAS_SIZE, atlas.pixels(), true)
            .map_err(|err| DecalError::resource(ResourceKind::ScarAtlas, "scars", err))
    }
}
