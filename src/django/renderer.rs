use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use super::context::RenderContext;
use super::templates::TemplateSet;
use super::writer::AppWriter;
use super::GenerationError;

/// A string transform exposed to templates as a filter
pub type Helper = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Named helpers available to every template
#[derive(Clone, Default)]
pub struct HelperRegistry {
    helpers: Vec<(String, Helper)>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        HelperRegistry::default()
    }

    /// `to_lower`, used to turn a message name into a URL segment
    pub fn with_defaults() -> Self {
        let mut registry = HelperRegistry::new();
        registry.register("to_lower", |value: &str| value.to_lowercase());
        registry
    }

    /// Adds a helper, replacing any helper already registered under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, helper: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let name = name.into();
        self.helpers.retain(|(existing, _)| *existing != name);
        self.helpers.push((name, Arc::new(helper)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Helper> {
        self.helpers
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, helper)| helper)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.iter().map(|(name, _)| name.as_str())
    }
}

impl std::fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Compiles a template set once and renders it against a context
pub struct TemplateRenderer {
    env: Environment<'static>,
    templates: TemplateSet,
}

impl TemplateRenderer {
    /// Compiles every template in `templates`.
    ///
    /// # Errors
    ///
    /// `GenerationError::TemplateSyntax` naming the first template that
    /// does not compile.
    pub fn new(templates: TemplateSet, helpers: &HelperRegistry) -> Result<Self, GenerationError> {
        let mut env = Environment::new();
        // Generating Python, not HTML
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        for (name, helper) in &helpers.helpers {
            let helper = Arc::clone(helper);
            env.add_filter(name.clone(), move |value: String| -> String { helper(&value) });
        }

        for spec in templates.templates() {
            env.add_template_owned(spec.name.clone(), spec.source.clone())
                .map_err(|source| GenerationError::TemplateSyntax {
                    name: spec.name.clone(),
                    source,
                })?;
            debug!("Compiled template {}", spec.name);
        }

        Ok(TemplateRenderer { env, templates })
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Renders one template by name.
    pub fn render(&self, name: &str, context: &RenderContext) -> Result<String, GenerationError> {
        let render_error = |source| GenerationError::RenderExecution {
            name: name.to_string(),
            source,
        };
        let template = self.env.get_template(name).map_err(render_error)?;
        template.render(context).map_err(render_error)
    }

    /// Creates the app directory tree, writes the static files, then renders
    /// and writes each template in order. Stops at the first failure; files
    /// already written stay on disk.
    pub fn generate(
        &self,
        context: &RenderContext,
        writer: &AppWriter,
    ) -> Result<Vec<PathBuf>, GenerationError> {
        writer.prepare()?;

        let mut written = Vec::new();
        for file in self.templates.static_files() {
            written.push(writer.write_file(&file.path, &file.content)?);
        }
        for spec in self.templates.templates() {
            let content = self.render(&spec.name, context)?;
            written.push(writer.write_file(&spec.output, &content)?);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::django::type_map::TypeMapper;
    use crate::parser::parse_schema;

    fn context(schema: &str, output_dir: &str) -> RenderContext {
        let mapper = TypeMapper::default();
        let messages = parse_schema(schema)
            .unwrap()
            .messages
            .into_iter()
            .map(|m| mapper.map_message(m))
            .collect();
        RenderContext::new(output_dir, messages)
    }

    fn django_renderer() -> TemplateRenderer {
        TemplateRenderer::new(TemplateSet::django(), &HelperRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn test_default_helpers() {
        let helpers = HelperRegistry::with_defaults();
        assert_eq!(helpers.names().collect::<Vec<_>>(), vec!["to_lower"]);
        let to_lower = helpers.get("to_lower").unwrap();
        assert_eq!(to_lower("BlogPost"), "blogpost");
        assert!(helpers.get("to_upper").is_none());
    }

    #[test]
    fn test_register_replaces_helper() {
        let mut helpers = HelperRegistry::with_defaults();
        helpers.register("to_lower", |value: &str| format!("{}s", value.to_lowercase()));
        assert_eq!(helpers.names().count(), 1);
        assert_eq!((helpers.get("to_lower").unwrap())("Post"), "posts");
    }

    #[test]
    fn test_render_models() {
        let renderer = django_renderer();
        let ctx = context(
            "message User { string name = 1; int32 age = 2; } message Ping {}",
            "out/accounts",
        );

        let models = renderer.render("models", &ctx).unwrap();
        assert_eq!(
            models,
            "from django.db import models\n\
             \n\
             \n\
             class User(models.Model):\n    \
             name = models.CharField(max_length=255)\n    \
             age = models.IntegerField()\n\
             \n\
             \n\
             class Ping(models.Model):\n    \
             pass\n"
        );
    }

    #[test]
    fn test_render_apps() {
        let renderer = django_renderer();
        let ctx = context("", "out/accounts");

        let apps = renderer.render("apps", &ctx).unwrap();
        assert_eq!(
            apps,
            "from django.apps import AppConfig\n\
             \n\
             \n\
             class AccountsConfig(AppConfig):\n    \
             default_auto_field = 'django.db.models.BigAutoField'\n    \
             name = 'accounts'\n"
        );
    }

    #[test]
    fn test_render_urls_uses_lowercase_segment() {
        let renderer = django_renderer();
        let ctx = context("message BlogPost { string title = 1; }", "out/blog");

        let urls = renderer.render("urls", &ctx).unwrap();
        assert!(urls.contains("from .viewsets import BlogPostViewSet\n"));
        assert!(urls.contains("router.register(r'blogpost', BlogPostViewSet)\n"));
        assert!(urls.ends_with("urlpatterns = [\n    path('', include(router.urls)),\n]\n"));
    }

    #[test]
    fn test_custom_helper_reaches_templates() {
        let mut helpers = HelperRegistry::with_defaults();
        helpers.register("to_lower", |value: &str| format!("{}s", value.to_lowercase()));
        let renderer = TemplateRenderer::new(TemplateSet::django(), &helpers).unwrap();
        let ctx = context("message Post {}", "out/blog");

        let urls = renderer.render("urls", &ctx).unwrap();
        assert!(urls.contains("router.register(r'posts', PostViewSet)"));
    }

    #[test]
    fn test_template_syntax_error_names_template() {
        let mut templates = TemplateSet::django();
        templates.add_template("broken", "broken.py", "{% for message in %}");

        let err = TemplateRenderer::new(templates, &HelperRegistry::with_defaults())
            .err()
            .unwrap();
        match err {
            GenerationError::TemplateSyntax { name, .. } => assert_eq!(name, "broken"),
            other => panic!("expected TemplateSyntax, got {:?}", other),
        }
    }

    #[test]
    fn test_undefined_variable_is_render_error() {
        let mut templates = TemplateSet::new();
        templates.add_template("settings", "settings.py", "DEBUG = {{ debug_flag }}\n");
        let renderer = TemplateRenderer::new(templates, &HelperRegistry::with_defaults()).unwrap();

        let err = renderer.render("settings", &context("", "out/app")).unwrap_err();
        match err {
            GenerationError::RenderExecution { name, .. } => assert_eq!(name, "settings"),
            other => panic!("expected RenderExecution, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_template_is_render_error() {
        let renderer = django_renderer();
        let err = renderer.render("missing", &context("", "out/app")).unwrap_err();
        assert!(matches!(err, GenerationError::RenderExecution { .. }));
    }

    #[test]
    fn test_every_message_is_registered_everywhere() {
        let renderer = django_renderer();
        let ctx = context(
            "message Author { string name = 1; } message Book { Author author = 1; }",
            "out/library",
        );

        let serializers = renderer.render("serializers", &ctx).unwrap();
        let viewsets = renderer.render("viewsets", &ctx).unwrap();
        let admin = renderer.render("admin", &ctx).unwrap();

        for name in ["Author", "Book"] {
            assert!(serializers.contains(&format!(
                "class {}Serializer(serializers.ModelSerializer):\n    class Meta:\n        model = {}\n        fields = '__all__'\n",
                name, name
            )));
            assert!(viewsets.contains(&format!(
                "class {0}ViewSet(viewsets.ModelViewSet):\n    queryset = {0}.objects.all()\n    serializer_class = {0}Serializer\n",
                name
            )));
            assert!(admin.contains(&format!("admin.site.register({})\n", name)));
        }
    }
}
