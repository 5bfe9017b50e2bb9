use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct Notebook {
    #[serde(default)]
    metadata: NotebookMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct NotebookMetadata {
    #[serde(default)]
    colab: Option<ColabMetadata>,
    #[serde(default)]
    kernelspec: Option<KernelSpec>,
}

#[derive(Debug, Deserialize)]
struct ColabMetadata {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KernelSpec {
    #[serde(default)]
    display_name: Option<String>,
}

/// Title of a Jupyter notebook: its Colab name, followed by the kernel's
/// display name in parentheses when one is declared.
///
/// Returns `None` for invalid JSON or a notebook without a Colab name.
///
/// ```rust
/// use urltitle_core::formats::notebook_title;
///
/// let json = br#"{"metadata": {"colab": {"name": "demo.ipynb"}, "kernelspec": {"display_name": "Python 3"}}}"#;
/// assert_eq!(notebook_title(json).as_deref(), Some("demo.ipynb (Python 3)"));
/// ```
pub fn notebook_title(json: &[u8]) -> Option<String> {
    let notebook: Notebook = match serde_json::from_slice(json) {
        Ok(notebook) => notebook,
        Err(e) => {
            tracing::debug!("Unable to parse notebook JSON: {}", e);
            return None;
        }
    };

    let metadata = notebook.metadata;
    let name = metadata.colab.and_then(|colab| colab.name)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    match metadata.kernelspec.and_then(|k| k.display_name).filter(|k| !k.is_empty()) {
        Some(kernel) => Some(format!("{} ({})", name, kernel)),
        None => Some(name.to_string()),
    }
}
