use anyhow::Result;
use vergen_gitcl::{Emitter, GitclBuilder};

pub fn main() -> Result<()> {
    if Emitter::default()
        .add_instructions(&GitclBuilder::all_git()?)?
        .emit()
        .is_err()
    {
        // only the git sha is injected, a source tarball has none
        println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown");
    }
    Ok(())
}
