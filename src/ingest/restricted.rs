use std::path::Path;
use std::sync::LazyLock;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// File name suffixes that are never attached.
const RESTRICTED_SUFFIXES: &[&str] = &[
    // Images
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".ico", ".tiff", ".webp", ".heic", ".raw", ".psd", ".ai", ".xcf",
    ".svg",
    // Audio/Video
    ".mp4", ".mkv", ".mov", ".mp3", ".wav", ".flac", ".aac", ".m4a", ".webm", ".avi", ".wmv", ".wma",
    // Archives
    ".zip", ".tar", ".gz", ".7z", ".rar", ".iso", ".jar", ".tgz", ".bz2", ".xz", ".cab", ".z", ".lz4", ".zst",
    // Installers & packages
    ".dmg", ".pkg", ".deb", ".rpm", ".msi", ".msix", ".apk", ".war", ".ear",
    // Executables & bytecode
    ".exe", ".dll", ".so", ".bin", ".o", ".obj", ".pyc", ".pyo", ".pyd", ".class", ".dylib", ".elf", ".wasm",
    ".node",
    // Model weights & data
    ".onnx", ".tflite", ".pth", ".h5", ".ckpt", ".pt", ".safetensors", ".parquet", ".arrow", ".npy", ".npz",
    ".pickle", ".pkl",
    // Documents
    ".pdf", ".epub", ".mobi", ".djvu", ".docx", ".xlsx", ".pptx", ".odt", ".ods", ".odp", ".doc", ".xls", ".ppt",
    // Fonts
    ".ttf", ".otf", ".woff", ".woff2", ".eot", ".cur", ".ani",
    // Databases & disk images
    ".db", ".sqlite", ".sqlite3", ".mdb", ".accdb", ".vdi", ".vmdk", ".qcow2", ".ova", ".img",
    // System metadata
    ".ds_store", "thumbs.db", ".swp", ".journal",
];

static RESTRICTED: LazyLock<GlobSet> = LazyLock::new(|| {
    let mut builder = GlobSetBuilder::new();
    for suffix in RESTRICTED_SUFFIXES {
        let glob = GlobBuilder::new(&format!("*{}", suffix))
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .expect("invalid restricted glob");
        builder.add(glob);
    }
    builder.build().expect("invalid restricted glob set")
});

/// True when the file name carries a restricted suffix.
pub fn is_restricted(path: &Path) -> bool {
    path.file_name().is_some_and(|name| RESTRICTED.is_match(Path::new(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_and_media_are_restricted() {
        for name in ["photo.PNG", "lib/libfoo.so", "model.safetensors", "Thumbs.db", "notes.pdf", ".DS_Store"] {
            assert!(is_restricted(Path::new(name)), "{} should be restricted", name);
        }
    }

    #[test]
    fn text_files_pass() {
        for name in ["main.rs", "README.md", "config.toml", "zipper.py", "sozo"] {
            assert!(!is_restricted(Path::new(name)), "{} should pass", name);
        }
    }
}
