use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use multimap::MultiMap;
use regex::{Captures, Regex};
use serde::Deserialize;
use strum::{Display, EnumIter};

const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum State {
    #[strum(to_string = "Not available")]
    NotAvailable,
    #[strum(to_string = "Not installed")]
    NotInstalled,
    #[strum(to_string = "Update available")]
    UpdateAvailable,
    #[strum(to_string = "Up to date")]
    Actual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum Action {
    #[default]
    #[strum(to_string = "")]
    NoAction,
    Remove,
    Install,
}

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub url: String,
    pub raw_path: String,
    /// `None` when the path holds an unknown placeholder.
    pub expanded_path: Option<PathBuf>,
    pub download_path: Option<PathBuf>,
    pub md5: String,
    pub version_date: DateTime<Utc>,
}

pub type UserActions = MultiMap<Action, File>;

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub state: State,
    pub action: Action,
    pub version: String,
    pub files: Vec<File>,
    /// Only reports its state, e.g. the application itself.
    pub check_only: bool,
    pub children: Vec<Component>,
}

impl Component {
    pub fn can_set(&self, action: Action) -> bool {
        if self.check_only || self.files.is_empty() {
            return action == Action::NoAction;
        }
        match action {
            Action::NoAction => true,
            Action::Install => matches!(self.state, State::NotInstalled | State::UpdateAvailable),
            Action::Remove => matches!(self.state, State::Actual | State::UpdateAvailable),
        }
    }

    fn has_updates(&self) -> bool {
        self.state == State::UpdateAvailable || self.children.iter().any(Component::has_updates)
    }

    fn fill_user_actions(&self, actions: &mut UserActions) {
        if self.action != Action::NoAction && !self.check_only {
            for file in &self.files {
                actions.insert(self.action, file.clone());
            }
        }
        for child in &self.children {
            child.fill_user_actions(actions);
        }
    }
}

/// Flattened component for table display.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRow {
    pub path: Vec<usize>,
    pub depth: usize,
    pub name: String,
    pub state: State,
    pub action: Action,
    pub version: String,
    pub files: String,
    pub editable: bool,
}

#[derive(Deserialize)]
struct ManifestJson {
    version: u32,
    #[serde(default)]
    components: Vec<ComponentJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentJson {
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    files: Vec<FileJson>,
    #[serde(default)]
    check_only: bool,
    #[serde(default)]
    components: Vec<ComponentJson>,
}

#[derive(Deserialize)]
struct FileJson {
    url: String,
    path: String,
    #[serde(default)]
    md5: String,
    date: DateTime<Utc>,
}

/// Tree of installable components described by the update manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    root: Vec<Component>,
    expansions: BTreeMap<String, String>,
}

impl Model {
    pub fn with_expansions(expansions: BTreeMap<String, String>) -> Self {
        Self {
            root: vec![],
            expansions,
        }
    }

    pub fn parse(&mut self, data: &[u8]) -> Result<()> {
        let manifest: ManifestJson =
            serde_json::from_slice(data).context("Failed to parse update info")?;
        if manifest.version != SUPPORTED_VERSION {
            bail!("Unsupported update info version: {}", manifest.version);
        }

        self.root = manifest
            .components
            .into_iter()
            .map(|x| self.convert(x))
            .collect();
        Ok(())
    }

    fn convert(&self, json: ComponentJson) -> Component {
        let files = json
            .files
            .into_iter()
            .map(|x| File {
                expanded_path: self.expanded(&x.path),
                url: x.url,
                raw_path: x.path,
                download_path: None,
                md5: x.md5,
                version_date: x.date,
            })
            .collect();

        Component {
            name: json.name,
            state: State::NotAvailable,
            action: Action::NoAction,
            version: json.version,
            files,
            check_only: json.check_only,
            children: json
                .components
                .into_iter()
                .map(|x| self.convert(x))
                .collect(),
        }
    }

    pub fn set_expansions(&mut self, expansions: BTreeMap<String, String>) {
        self.expansions = expansions;

        let mut root = std::mem::take(&mut self.root);
        for component in &mut root {
            self.expand_component(component);
        }
        self.root = root;
    }

    fn expand_component(&self, component: &mut Component) {
        for file in &mut component.files {
            file.expanded_path = self.expanded(&file.raw_path);
        }
        for child in &mut component.children {
            self.expand_component(child);
        }
    }

    /// Replaces `$name$` placeholders.
    pub fn expanded(&self, source: &str) -> Option<PathBuf> {
        let Ok(re) = Regex::new(r"\$(\w+)\$") else {
            return None;
        };

        let mut missing = false;
        let expanded = re.replace_all(source, |caps: &Captures<'_>| {
            match self.expansions.get(&caps[1]) {
                Some(value) => value.clone(),
                None => {
                    missing = true;
                    String::new()
                }
            }
        });

        (!missing && !expanded.is_empty()).then(|| PathBuf::from(expanded.as_ref()))
    }

    pub fn update_states(&mut self) {
        for component in &mut self.root {
            update_state(component);
        }
    }

    pub fn has_updates(&self) -> bool {
        self.root.iter().any(Component::has_updates)
    }

    pub fn user_actions(&self) -> UserActions {
        let mut actions = UserActions::new();
        for component in &self.root {
            component.fill_user_actions(&mut actions);
        }
        actions
    }

    #[cfg(test)]
    pub fn component(&self, path: &[usize]) -> Option<&Component> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.root.get(*first)?, |x, i| x.children.get(*i))
    }

    fn component_mut(&mut self, path: &[usize]) -> Option<&mut Component> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.root.get_mut(*first)?, |x, i| x.children.get_mut(*i))
    }

    /// Returns whether the action was accepted.
    pub fn set_action(&mut self, path: &[usize], action: Action) -> bool {
        match self.component_mut(path) {
            Some(component) if component.can_set(action) => {
                component.action = action;
                true
            }
            _ => false,
        }
    }

    pub fn rows(&self) -> Vec<ComponentRow> {
        let mut rows = vec![];
        for (i, component) in self.root.iter().enumerate() {
            fill_rows(&mut rows, component, vec![i]);
        }
        rows
    }
}

fn fill_rows(rows: &mut Vec<ComponentRow>, component: &Component, path: Vec<usize>) {
    rows.push(ComponentRow {
        depth: path.len() - 1,
        name: component.name.clone(),
        state: component.state,
        action: component.action,
        version: component.version.clone(),
        files: component
            .files
            .iter()
            .map(|x| file_name(&x.raw_path))
            .join(", "),
        editable: !component.check_only && !component.files.is_empty(),
        path: path.clone(),
    });

    for (i, child) in component.children.iter().enumerate() {
        let mut child_path = path.clone();
        child_path.push(i);
        fill_rows(rows, child, child_path);
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|x| x.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

fn update_state(component: &mut Component) {
    component.action = Action::NoAction;

    for child in &mut component.children {
        update_state(child);
    }

    component.state = if component.files.is_empty() {
        State::NotAvailable
    } else {
        component
            .files
            .iter()
            .map(current_state)
            .min_by_key(|x| severity(*x))
            .unwrap_or(State::NotAvailable)
    };
}

fn severity(state: State) -> u8 {
    match state {
        State::NotAvailable => 0,
        State::NotInstalled => 1,
        State::UpdateAvailable => 2,
        State::Actual => 3,
    }
}

pub fn current_state(file: &File) -> State {
    let Some(path) = &file.expanded_path else {
        return State::NotAvailable;
    };

    let Ok(metadata) = std::fs::metadata(path) else {
        return State::NotInstalled;
    };

    match metadata.modified() {
        Ok(modified) if DateTime::<Utc>::from(modified) >= file.version_date => State::Actual,
        _ => State::UpdateAvailable,
    }
}
