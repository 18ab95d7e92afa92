use std::fs;
use std::path::Path;

use anyhow::{Result, bail};
use log::{info, warn};

use super::model::{Action, File, UserActions};

/// Applies downloaded files and removals after checking all of them.
pub struct Installer {
    actions: UserActions,
    errors: Vec<String>,
}

impl Installer {
    pub fn new(actions: UserActions) -> Self {
        Self {
            actions,
            errors: vec![],
        }
    }

    pub fn error_string(&self) -> String {
        self.errors.join("\n")
    }

    pub fn check(&mut self) -> bool {
        self.errors.clear();

        let actions = std::mem::take(&mut self.actions);
        for (action, files) in actions.iter_all() {
            for file in files {
                match action {
                    Action::Remove => self.check_remove(file),
                    Action::Install => self.check_install(file),
                    Action::NoAction => {}
                }
            }
        }
        self.actions = actions;

        self.errors.is_empty()
    }

    /// Nothing is touched when any check fails.
    pub fn commit(&mut self) -> Result<()> {
        if !self.check() {
            bail!(self.error_string());
        }

        let actions = std::mem::take(&mut self.actions);
        if let Some(files) = actions.get_vec(&Action::Remove) {
            files.iter().for_each(|x| self.remove(x));
        }
        if let Some(files) = actions.get_vec(&Action::Install) {
            files.iter().for_each(|x| self.install(x));
        }

        if !self.errors.is_empty() {
            bail!(self.error_string());
        }
        Ok(())
    }

    fn check_remove(&mut self, file: &File) {
        let Some(path) = &file.expanded_path else {
            self.errors.push(format!("Unknown target path: {}", file.raw_path));
            return;
        };

        match fs::metadata(path) {
            Ok(metadata) if metadata.permissions().readonly() => self
                .errors
                .push(format!("Can not remove file: {}", path.display())),
            Ok(_) => {}
            Err(_) => self
                .errors
                .push(format!("File to remove not found: {}", path.display())),
        }
    }

    fn check_install(&mut self, file: &File) {
        let Some(target) = &file.expanded_path else {
            self.errors.push(format!("Unknown target path: {}", file.raw_path));
            return;
        };

        let Some(download) = file.download_path.as_deref().filter(|x| x.exists()) else {
            self.errors
                .push(format!("Downloaded file not found: {}", file.url));
            return;
        };

        if !file.md5.is_empty() {
            match checksum(download) {
                Ok(sum) if sum.eq_ignore_ascii_case(&file.md5) => {}
                Ok(_) => self.errors.push(format!("Checksum mismatch: {}", file.url)),
                Err(e) => self.errors.push(format!("{}: {e}", download.display())),
            }
        }

        if let Some(dir) = target.parent()
            && fs::create_dir_all(dir).is_err()
        {
            self.errors
                .push(format!("Can not create directory: {}", dir.display()));
        }

        if let Ok(metadata) = fs::metadata(target)
            && metadata.permissions().readonly()
        {
            self.errors
                .push(format!("Can not replace file: {}", target.display()));
        }
    }

    fn remove(&mut self, file: &File) {
        let Some(path) = &file.expanded_path else {
            return;
        };

        match fs::remove_file(path) {
            Ok(()) => info!("Removed {}", path.display()),
            Err(e) => {
                warn!("Failed to remove {}: {e}", path.display());
                self.errors
                    .push(format!("Failed to remove file: {}", path.display()));
            }
        }
    }

    fn install(&mut self, file: &File) {
        let (Some(target), Some(download)) = (&file.expanded_path, &file.download_path) else {
            return;
        };

        let result = fs::rename(download, target)
            .or_else(|_| fs::copy(download, target).map(|_| ()));

        match result {
            Ok(()) => info!("Installed {}", target.display()),
            Err(e) => {
                warn!("Failed to install {}: {e}", target.display());
                self.errors
                    .push(format!("Failed to install file: {}", target.display()));
            }
        }
    }
}

pub fn checksum(path: &Path) -> Result<String> {
    let data = fs::read(path)?;
    Ok(format!("{:x}", md5::compute(data)))
}
