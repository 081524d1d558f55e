use serde::Deserialize;
use serde_json::{json, Value};

use crate::connection::Connection;
use crate::errors::ClientError;

/// Template kind, matching the wire `TYPE` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TemplateKind {
    #[serde(rename = "Optimization")]
    Optimization,
    #[serde(rename = "Risk-Model")]
    RiskModel,
}

/// Wire shape of one template-list entry.
#[derive(Debug, Deserialize)]
pub(crate) struct RawTemplate {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "TYPE")]
    pub kind: TemplateKind,
    #[serde(rename = "DESCRIPTION", default)]
    pub description: String,
    #[serde(rename = "CONTENT")]
    pub content: Value,
}

/// A named, reusable job configuration document.
///
/// `content` is always a JSON object; typed mutators on the kind-specific
/// wrappers write only into it. `save` creates a new named template on the
/// server and never mutates the original record.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    kind: TemplateKind,
    description: String,
    content: Value,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        kind: TemplateKind,
        description: impl Into<String>,
        content: Value,
    ) -> Result<Self, ClientError> {
        if !content.is_object() {
            return Err(ClientError::Decode(
                "template content is not a JSON object".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            kind,
            description: description.into(),
            content,
        })
    }

    pub(crate) fn from_raw(raw: RawTemplate) -> Result<Self, ClientError> {
        Self::new(raw.name, raw.kind, raw.description, raw.content)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Value {
        &mut self.content
    }

    /// Saves the current content under `name` ("save as"). The template the
    /// content was loaded from keeps its identity.
    pub async fn save(&self, conn: &Connection, name: &str) -> Result<(), ClientError> {
        let mut body = self.content.clone();
        body["name"] = json!(name);
        conn.transport().post_json("template", &body).await?;
        Ok(())
    }
}

/// Typed view over an optimization template. All mutators write into the
/// underlying content document; no validation is applied.
#[derive(Debug, Clone)]
pub struct OptimizationTemplate(Template);

impl OptimizationTemplate {
    pub fn new(template: Template) -> Result<Self, ClientError> {
        match template.kind() {
            TemplateKind::Optimization => Ok(Self(template)),
            TemplateKind::RiskModel => Err(ClientError::Validation(format!(
                "template {} is a risk-model template",
                template.name()
            ))),
        }
    }

    pub fn objective(&self) -> Option<&Value> {
        self.0.content().get("objective")
    }

    pub fn target_risk(&self) -> Option<&Value> {
        self.0.content().get("target_risk")
    }

    pub fn set_target_risk(&mut self, target_risk: f64) {
        self.0.content_mut()["target_risk"] = json!(target_risk);
    }

    pub fn bounds(&self) -> Option<&Value> {
        self.0.content().get("bound")
    }

    pub fn set_bounds(&mut self, bounds: Value) {
        self.0.content_mut()["bound"] = bounds;
    }

    pub fn max_adv_participation(&self) -> Option<&Value> {
        self.0.content().get("max_ADV_participation")
    }

    pub fn set_max_adv_participation(&mut self, participation: f64) {
        self.0.content_mut()["max_ADV_participation"] = json!(participation);
    }

    pub fn max_turnover(&self) -> Option<&Value> {
        self.0.content().get("max_turnover")
    }

    pub fn set_max_turnover(&mut self, turnover: f64) {
        self.0.content_mut()["max_turnover"] = json!(turnover);
    }

    pub fn gross_weight(&self) -> Option<&Value> {
        self.0.content().get("gross_weight")
    }

    pub fn set_gross_weight(&mut self, gross_weight: f64) {
        self.0.content_mut()["gross_weight"] = json!(gross_weight);
    }

    pub fn net_weight(&self) -> Option<&Value> {
        self.0.content().get("net_weight")
    }

    pub fn set_net_weight(&mut self, net_weight: f64) {
        self.0.content_mut()["net_weight"] = json!(net_weight);
    }

    pub fn benchmark(&self) -> Option<&Value> {
        self.0.content().get("benchmark")
    }

    pub fn set_benchmark(&mut self, benchmark: &str) {
        self.0.content_mut()["benchmark"] = json!(benchmark);
    }
}

impl std::ops::Deref for OptimizationTemplate {
    type Target = Template;

    fn deref(&self) -> &Template {
        &self.0
    }
}

impl std::ops::DerefMut for OptimizationTemplate {
    fn deref_mut(&mut self) -> &mut Template {
        &mut self.0
    }
}

/// Typed view over a risk-model template.
#[derive(Debug, Clone)]
pub struct RiskModelTemplate(Template);

impl RiskModelTemplate {
    pub fn new(template: Template) -> Result<Self, ClientError> {
        match template.kind() {
            TemplateKind::RiskModel => Ok(Self(template)),
            TemplateKind::Optimization => Err(ClientError::Validation(format!(
                "template {} is an optimization template",
                template.name()
            ))),
        }
    }

    pub fn factors(&self) -> &[Value] {
        self.0
            .content()
            .get("factors")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn meta(&self) -> &[Value] {
        self.0
            .content()
            .get("meta")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn cov_args(&self) -> Option<&Value> {
        self.0.content().get("covArgs")
    }

    pub fn options(&self) -> Option<&Value> {
        self.0.content().get("options")
    }

    /// Appends a factor to the factor list, creating the list if absent.
    pub fn add_factor(&mut self, mnemonic: &str, name: &str) {
        Self::push_entry(self.0.content_mut(), "factors", mnemonic, name);
    }

    pub fn add_meta(&mut self, mnemonic: &str, name: &str) {
        Self::push_entry(self.0.content_mut(), "meta", mnemonic, name);
    }

    fn push_entry(content: &mut Value, key: &str, mnemonic: &str, name: &str) {
        let entry = json!({ "mnemonic": mnemonic, "name": name });
        match content.get_mut(key).and_then(Value::as_array_mut) {
            Some(list) => list.push(entry),
            None => content[key] = json!([entry]),
        }
    }

    pub fn set_cov_interval(&mut self, interval: &str) {
        self.0.content_mut()["covArgs"]["interval"] = json!(interval);
    }

    pub fn set_var_half_life(&mut self, half_life: u32) {
        self.0.content_mut()["covArgs"]["var.period"] = json!(half_life);
    }

    pub fn set_covar_half_life(&mut self, half_life: u32) {
        self.0.content_mut()["covArgs"]["cov.period"] = json!(half_life);
    }

    /// The one business rule enforced client-side: shrinkage must lie in
    /// `[0, 1]`.
    pub fn set_specific_risk_shrinkage(&mut self, shrinkage: f64) -> Result<(), ClientError> {
        if !(0.0..=1.0).contains(&shrinkage) {
            return Err(ClientError::Validation(format!(
                "specific risk shrinkage must be between 0 and 1, got {}",
                shrinkage
            )));
        }
        self.0.content_mut()["options"]["spRisk"]["shrinkage"] = json!(shrinkage);
        Ok(())
    }
}

impl std::ops::Deref for RiskModelTemplate {
    type Target = Template;

    fn deref(&self) -> &Template {
        &self.0
    }
}

impl std::ops::DerefMut for RiskModelTemplate {
    fn deref_mut(&mut self) -> &mut Template {
        &mut self.0
    }
}

/// A template-list entry dispatched to its typed variant.
#[derive(Debug, Clone)]
pub enum TemplateVariant {
    Optimization(OptimizationTemplate),
    RiskModel(RiskModelTemplate),
}

impl TemplateVariant {
    pub(crate) fn from_raw(raw: RawTemplate) -> Result<Self, ClientError> {
        let template = Template::from_raw(raw)?;
        Ok(match template.kind() {
            TemplateKind::Optimization => {
                TemplateVariant::Optimization(OptimizationTemplate::new(template)?)
            }
            TemplateKind::RiskModel => TemplateVariant::RiskModel(RiskModelTemplate::new(template)?),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            TemplateVariant::Optimization(t) => t.name(),
            TemplateVariant::RiskModel(t) => t.name(),
        }
    }

    pub fn kind(&self) -> TemplateKind {
        match self {
            TemplateVariant::Optimization(_) => TemplateKind::Optimization,
            TemplateVariant::RiskModel(_) => TemplateKind::RiskModel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk_template() -> RiskModelTemplate {
        let template = Template::new(
            "base-risk",
            TemplateKind::RiskModel,
            "test fixture",
            json!({ "factors": [], "meta": [], "covArgs": {}, "options": {} }),
        )
        .unwrap();
        RiskModelTemplate::new(template).unwrap()
    }

    #[test]
    fn test_shrinkage_bounds() {
        let mut template = risk_template();

        assert!(matches!(
            template.set_specific_risk_shrinkage(1.5),
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            template.set_specific_risk_shrinkage(-0.1),
            Err(ClientError::Validation(_))
        ));

        template.set_specific_risk_shrinkage(0.0).unwrap();
        template.set_specific_risk_shrinkage(1.0).unwrap();
        template.set_specific_risk_shrinkage(0.3).unwrap();
        assert_eq!(
            template.content()["options"]["spRisk"]["shrinkage"],
            json!(0.3)
        );
    }

    #[test]
    fn test_add_factor_is_append_only() {
        let mut template = risk_template();
        template.add_factor("MOM", "Momentum");
        template.add_factor("VAL", "Value");

        let factors = template.factors();
        assert_eq!(factors.len(), 2);
        assert_eq!(factors[0]["mnemonic"], "MOM");
        assert_eq!(factors[1]["name"], "Value");
    }

    #[test]
    fn test_add_factor_creates_missing_list() {
        let template = Template::new("t", TemplateKind::RiskModel, "", json!({})).unwrap();
        let mut template = RiskModelTemplate::new(template).unwrap();
        template.add_meta("SEC", "Sector");
        assert_eq!(template.meta().len(), 1);
    }

    #[test]
    fn test_cov_args_setters_write_wire_keys() {
        let mut template = risk_template();
        template.set_cov_interval("weekly");
        template.set_var_half_life(90);
        template.set_covar_half_life(180);

        let cov = template.cov_args().unwrap();
        assert_eq!(cov["interval"], json!("weekly"));
        assert_eq!(cov["var.period"], json!(90));
        assert_eq!(cov["cov.period"], json!(180));
    }

    #[test]
    fn test_optimization_setters_write_into_content() {
        let template = Template::new("opt", TemplateKind::Optimization, "", json!({})).unwrap();
        let mut template = OptimizationTemplate::new(template).unwrap();

        template.set_target_risk(0.12);
        template.set_max_turnover(0.4);
        template.set_benchmark("SPX");

        assert_eq!(template.content()["target_risk"], json!(0.12));
        assert_eq!(template.content()["max_turnover"], json!(0.4));
        assert_eq!(template.content()["benchmark"], json!("SPX"));
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let template = Template::new("opt", TemplateKind::Optimization, "", json!({})).unwrap();
        assert!(matches!(
            RiskModelTemplate::new(template),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn test_non_object_content_is_rejected() {
        let result = Template::new("bad", TemplateKind::Optimization, "", json!([1, 2]));
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }
}
