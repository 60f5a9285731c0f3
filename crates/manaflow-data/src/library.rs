//! Named node templates: the selectable buildings a player can place.

use crate::loader::{
    DataLoadError, check_duplicate, check_non_negative, deserialize_list, require_data_file,
};
use crate::schema::{SlotData, TemplateData};
use manaflow_core::flow::FlowUnit;
use manaflow_core::node::ProductionNode;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Templates keyed by name, remembered in file order.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<(String, ProductionNode)>,
    by_name: HashMap<String, usize>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `templates.{ron,toml,json}` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, DataLoadError> {
        let path = require_data_file(dir, "templates")?;
        let data: Vec<TemplateData> = deserialize_list(&path, "templates")?;
        Self::from_data(data, &path)
    }

    /// Resolve parsed templates. `file` is only used in error messages.
    pub fn from_data(data: Vec<TemplateData>, file: &Path) -> Result<Self, DataLoadError> {
        let mut library = Self::new();
        for template in data {
            check_duplicate(&library.by_name, &template.name, file)?;
            let node = build_node(&template, file)?;
            library.insert(template.name, node);
        }
        debug!(file = %file.display(), templates = library.len(), "templates loaded");
        Ok(library)
    }

    /// Add or replace a template.
    pub fn insert(&mut self, name: impl Into<String>, node: ProductionNode) {
        let name = name.into();
        match self.by_name.get(&name) {
            Some(&index) => self.templates[index].1 = node,
            None => {
                self.by_name.insert(name.clone(), self.templates.len());
                self.templates.push((name, node));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ProductionNode> {
        self.by_name.get(name).map(|&index| &self.templates[index].1)
    }

    /// Template names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProductionNode)> {
        self.templates.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn build_node(template: &TemplateData, file: &Path) -> Result<ProductionNode, DataLoadError> {
    let mut node = ProductionNode::new();
    for slot in &template.inputs {
        node.add_input(build_unit(slot, &template.name, file)?);
    }
    for slot in &template.outputs {
        if slot.directions.is_empty() {
            warn!(template = %template.name, item = %slot.item, "output has no directions and will never move");
        }
        node.add_output(build_unit(slot, &template.name, file)?);
    }
    Ok(node)
}

fn build_unit(slot: &SlotData, template: &str, file: &Path) -> Result<FlowUnit, DataLoadError> {
    let rate = check_non_negative(slot.rate, "rate", template, file)?;
    let queued = check_non_negative(slot.queued, "queued", template, file)?;
    Ok(FlowUnit::new(slot.item.as_str(), rate, slot.directions).with_quantity(queued))
}
