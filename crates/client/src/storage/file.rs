//! File-backed cart storage.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::warn;

use samagri::cart::{Cart, CartId};

use crate::{
    cart::document::CartDocument,
    storage::{CartStore, StoreError},
};

/// Name of the cart document file within the state directory.
const CART_FILE: &str = "cart.json";

/// Name of the cart identifier file within the state directory.
const CART_ID_FILE: &str = "cart_id";

/// Cart storage backed by two small files in a state directory.
///
/// `cart.json` holds the full cart document and `cart_id` holds just the
/// identifier, mirroring the paired browser storage keys this replaces.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    dir: PathBuf,
}

impl FileCartStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Io`]: the directory could not be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(FileCartStore { dir })
    }

    fn cart_path(&self) -> PathBuf {
        self.dir.join(CART_FILE)
    }

    fn id_path(&self) -> PathBuf {
        self.dir.join(CART_ID_FILE)
    }
}

impl CartStore for FileCartStore {
    fn load(&self) -> Option<Cart> {
        let bytes = match fs::read(self.cart_path()) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(%error, "failed to read cart document, treating as absent");
                return None;
            }
        };

        let document: CartDocument = match serde_json::from_slice(&bytes) {
            Ok(document) => document,
            Err(error) => {
                warn!(%error, "ignoring malformed cart document");
                return None;
            }
        };

        match Cart::try_from(document) {
            Ok(cart) => Some(cart),
            Err(error) => {
                warn!(%error, "ignoring invalid cart document");
                None
            }
        }
    }

    fn stored_cart_id(&self) -> Option<CartId> {
        let raw = fs::read_to_string(self.id_path()).ok()?;
        let id = raw.trim();

        if id.is_empty() { None } else { Some(CartId::new(id)) }
    }

    fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(&CartDocument::from(cart))?;

        fs::write(self.cart_path(), encoded)?;
        fs::write(self.id_path(), cart.id().as_str())?;

        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        remove_if_present(&self.cart_path())?;
        remove_if_present(&self.id_path())?;

        Ok(())
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
