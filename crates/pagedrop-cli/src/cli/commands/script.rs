//! `pagedrop script`: print the in-page materializer script.

use anyhow::Result;
use pagedrop_core::classifier::is_blob_locator;
use pagedrop_core::config::PagedropConfig;
use pagedrop_core::materializer::MaterializerScript;

pub fn run_script(cfg: &PagedropConfig, blob: Option<&str>) -> Result<()> {
    let script = MaterializerScript::new(cfg);
    match blob {
        Some(url) => {
            if !is_blob_locator(url) {
                anyhow::bail!("not a blob locator: {}", url);
            }
            println!("{}", script.materialize(url));
        }
        None => println!("{}", script.install()),
    }
    Ok(())
}
