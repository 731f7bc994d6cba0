use home;
use std::path::{Path, PathBuf};

pub fn home_dir() -> Result<PathBuf, String> {
    if let Some(pathbuf) = home::home_dir() {
        return Ok(pathbuf);
    } else {
        let msg = "Failed to retrieve home directory.".to_string();
        return Err(msg);
    }
}

/*
Short form of the working directory for the prompt:
"~" for the home directory, otherwise "..<last component>",
falling back to the full path (e.g. for "/").
*/
pub fn prompt_dir(cwd: &Path, home: Option<&Path>) -> String {
    if home == Some(cwd) {
        return "~".to_string();
    }
    if let Some(name) = cwd.file_name().and_then(|os_str| os_str.to_str()) {
        return format!("..{}", name);
    }
    cwd.display().to_string()
}
