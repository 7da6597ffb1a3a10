//! The asset: one object's transform, subsets, surface models and geometry

use std::rc::Rc;

use crate::foundation::math::{Mat4, Vec3};

use super::geometry::Geometry;
use super::renderable::{Renderable, RenderableError, SubsetFailure, SubsetFailureKind};
use super::subset::{Subset, SurfaceModelRef};
use super::surface_model::SurfaceModel;
use super::transform::TransformBinding;

/// In-memory representation of one renderable object
///
/// The model matrix only changes through [`Asset::step_transforms`] (and the
/// debug placement helpers). Geometry and surface models are shared with
/// whoever else draws them; the asset never mutates either.
#[derive(Debug, Clone)]
pub struct Asset {
    name: String,
    model_matrix: Mat4,
    transform: TransformBinding,
    subsets: Vec<Subset>,
    surface_models: Vec<Rc<SurfaceModel>>,
    geometry: Option<Rc<Geometry>>,
}

impl Asset {
    /// Create an empty asset at the origin with no transform function
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_matrix: Mat4::identity(),
            transform: TransformBinding::None,
            subsets: Vec::new(),
            surface_models: Vec::new(),
            geometry: None,
        }
    }

    /// Set the initial placement
    pub fn with_model_matrix(mut self, model_matrix: Mat4) -> Self {
        self.model_matrix = model_matrix;
        self
    }

    /// Set the shared geometry
    pub fn with_geometry(mut self, geometry: Rc<Geometry>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Set the transform function
    pub fn with_transform(mut self, transform: TransformBinding) -> Self {
        self.transform = transform;
        self
    }

    /// Asset name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current placement in world space
    pub fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    /// Transform function binding
    pub fn transform(&self) -> &TransformBinding {
        &self.transform
    }

    /// Replace the transform function; [`TransformBinding::None`] clears it
    pub fn set_transform(&mut self, transform: TransformBinding) {
        self.transform = transform;
    }

    /// Shared geometry, if set
    pub fn geometry(&self) -> Option<&Rc<Geometry>> {
        self.geometry.as_ref()
    }

    /// Replace or clear the shared geometry
    pub fn set_geometry(&mut self, geometry: Option<Rc<Geometry>>) {
        self.geometry = geometry;
    }

    /// Subsets in draw order
    pub fn subsets(&self) -> &[Subset] {
        &self.subsets
    }

    /// Append a subset; it is drawn after every existing one
    pub fn add_subset(&mut self, subset: Subset) {
        self.subsets.push(subset);
    }

    /// Surface models subsets can refer to
    pub fn surface_models(&self) -> &[Rc<SurfaceModel>] {
        &self.surface_models
    }

    /// Append a surface model and return its index for [`SurfaceModelRef::Index`]
    pub fn add_surface_model(&mut self, surface_model: Rc<SurfaceModel>) -> usize {
        self.surface_models.push(surface_model);
        self.surface_models.len() - 1
    }

    /// Advance the model matrix by one step of `elapsed_seconds`
    ///
    /// With a transform function `f` set, the model matrix becomes
    /// `f(model_matrix, elapsed_seconds)`; without one this does nothing.
    /// Successive calls compose.
    pub fn step_transforms(&mut self, elapsed_seconds: f32) {
        debug_assert!(elapsed_seconds >= 0.0, "step_transforms called with negative elapsed time");

        match self.transform.resolve() {
            Some(function) => self.model_matrix = function(self.model_matrix, elapsed_seconds),
            None if self.transform.is_dangling() => {
                log::debug!("Asset '{}': transform function was dropped, skipping step", self.name);
            }
            None => {}
        }
    }

    /// Build one renderable per subset, in subset order
    ///
    /// An asset with no subsets returns `Ok` with an empty list, even when no
    /// geometry is set; [`RenderableError::MissingGeometry`] is only reported when
    /// there are subsets to draw. With subsets present, every subset must resolve to
    /// exactly one surface model and draw an index range inside the geometry. Failures are collected and reported once
    /// per call; the renderables of the subsets that did resolve are carried in
    /// [`RenderableError::Subsets`]. The asset itself is not modified.
    pub fn generate_renderables(&self) -> Result<Vec<Renderable>, RenderableError> {
        if self.subsets.is_empty() {
            return Ok(Vec::new());
        }

        let Some(geometry) = &self.geometry else {
            let error = RenderableError::MissingGeometry { subsets: self.subsets.len() };
            log::warn!("Asset '{}': {}", self.name, error);
            return Err(error);
        };

        let mut renderables = Vec::with_capacity(self.subsets.len());
        let mut failures = Vec::new();

        for (index, subset) in self.subsets.iter().enumerate() {
            let resolved = self
                .resolve_surface_model(&subset.surface_model)
                .and_then(|surface_model| {
                    geometry.validate_range(subset.range)?;
                    Ok(surface_model)
                });

            match resolved {
                Ok(surface_model) => renderables.push(Renderable {
                    subset: subset.name.clone(),
                    index_range: subset.range,
                    geometry: Rc::clone(geometry),
                    surface_model: Rc::clone(surface_model),
                    model_matrix: self.model_matrix,
                }),
                Err(kind) => failures.push(SubsetFailure { index, name: subset.name.clone(), kind }),
            }
        }

        if failures.is_empty() {
            log::trace!("Asset '{}': generated {} renderables", self.name, renderables.len());
            return Ok(renderables);
        }

        let error = RenderableError::Subsets {
            failures,
            partial: renderables,
            total: self.subsets.len(),
        };
        log::warn!("Asset '{}': {}", self.name, error);
        Err(error)
    }

    fn resolve_surface_model(&self, reference: &SurfaceModelRef) -> Result<&Rc<SurfaceModel>, SubsetFailureKind> {
        match reference {
            SurfaceModelRef::Index(index) => self
                .surface_models
                .get(*index)
                .ok_or_else(|| SubsetFailureKind::UnresolvedSurfaceModel(reference.to_string())),
            SurfaceModelRef::Named(name) => {
                let mut matches = self.surface_models.iter().filter(|model| &model.name == name);
                match (matches.next(), matches.count()) {
                    (Some(model), 0) => Ok(model),
                    (Some(_), others) => Err(SubsetFailureKind::AmbiguousSurfaceModel {
                        name: name.clone(),
                        matches: others + 1,
                    }),
                    (None, _) => Err(SubsetFailureKind::UnresolvedSurfaceModel(reference.to_string())),
                }
            }
        }
    }

    /// Debug placement: scale uniformly so the geometry's longest edge is one unit
    ///
    /// Overwrites the model matrix; identity when there is no geometry or it is
    /// degenerate.
    pub fn apply_unit_scalar_matrix(&mut self) {
        let extent = self
            .geometry
            .as_ref()
            .and_then(|geometry| geometry.bounds())
            .map(|bounds| bounds.largest_extent())
            .filter(|&extent| extent > f32::EPSILON);

        self.model_matrix = match extent {
            Some(extent) => Mat4::new_scaling(1.0 / extent),
            None => Mat4::identity(),
        };
        log::debug!("Asset '{}': unit scalar placement {:?}", self.name, extent);
    }

    /// Debug placement: translate so the geometry's bounding box is centered on the origin
    ///
    /// Overwrites the model matrix; identity when there is no geometry.
    pub fn apply_origin_center_matrix(&mut self) {
        let center = self
            .geometry
            .as_ref()
            .and_then(|geometry| geometry.bounds())
            .map_or_else(Vec3::zeros, |bounds| bounds.center());

        self.model_matrix = Mat4::new_translation(&-center);
        log::debug!("Asset '{}': origin center placement {:?}", self.name, center);
    }
}
