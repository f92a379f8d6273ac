//! Car brand and model selection.

use crate::{util::WrappingList, Car, CarModel};

pub const BRAND_LABEL: &str = "Brand";
pub const MODEL_LABEL: &str = "Model";
pub const NO_MODELS: &str = "No models available";

pub struct CarFilter {
    brands: WrappingList<Car>,
    models: WrappingList<CarModel>,
    brand: Option<String>,
    model: Option<String>,
    visible: bool,
}

impl CarFilter {
    pub fn new() -> Self {
        CarFilter {
            brands: WrappingList::default(),
            models: WrappingList::default(),
            brand: None,
            model: None,
            visible: true,
        }
    }

    /// Replace the brand list, keeping the current choice if the brand is
    /// still offered.
    pub fn set_cars(&mut self, cars: Vec<Car>) {
        self.brands = WrappingList::new(cars);

        let kept = match &self.brand {
            Some(brand) => self.brands.select_where(|c| &c.name == brand),
            None => false,
        };

        if kept {
            let model = self.model.take();
            self.load_models();
            if let Some(model) = model {
                if self.models.select_where(|m| m.name == model) {
                    self.model = Some(model);
                }
            }
        } else {
            self.brand = None;
            self.model = None;
            self.models = WrappingList::default();
        }
    }

    pub fn brands(&mut self) -> &mut WrappingList<Car> {
        &mut self.brands
    }

    pub fn models(&mut self) -> &mut WrappingList<CarModel> {
        &mut self.models
    }

    /// Labels of the model list; a brand without models gets a single
    /// placeholder entry.
    pub fn model_labels(&self) -> Vec<&str> {
        if self.brand.is_some() && self.models.is_empty() {
            return vec![NO_MODELS];
        }
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    /// Choose the highlighted brand, repopulating the models.
    pub fn select_brand(&mut self) -> Option<&str> {
        let name = self.brands.selected()?.name.clone();
        tracing::debug!(brand = %name, "brand selected");

        self.brand = Some(name);
        self.model = None;
        self.load_models();

        self.brand.as_deref()
    }

    /// Choose the highlighted model. The placeholder is not selectable.
    pub fn select_model(&mut self) -> Option<&str> {
        let name = self.models.selected()?.name.clone();
        tracing::debug!(model = %name, "model selected");

        self.model = Some(name);
        self.model.as_deref()
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn brand_label(&self) -> &str {
        self.brand().unwrap_or(BRAND_LABEL)
    }

    pub fn model_label(&self) -> &str {
        self.model().unwrap_or(MODEL_LABEL)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    fn load_models(&mut self) {
        let models = self
            .brands
            .selected()
            .map(|c| c.car_models.clone())
            .unwrap_or_default();
        self.models = WrappingList::new(models);
    }
}

impl Default for CarFilter {
    fn default() -> Self {
        Self::new()
    }
}
