//! Templated source builder for component modules and bootstrap programs.

use minijinja::{context, Environment};

use crate::error::SfcError;
use crate::template::{js_string, CompiledTemplate};

/// Renders generated JavaScript from fixed source templates.
#[derive(Debug)]
pub struct SourceBuilder {
    env: Environment<'static>,
}

impl SourceBuilder {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        env.add_template("component", COMPONENT_TEMPLATE)
            .expect("Failed to add component template");
        env.add_template("bootstrap", BOOTSTRAP_TEMPLATE)
            .expect("Failed to add bootstrap template");

        Self { env }
    }

    /// A self-evaluating expression yielding the component options object.
    ///
    /// `behavior` is an initializer body ending in a `return` of the options;
    /// the compiled render procedures replace whatever it declared.
    pub fn component(
        &self,
        behavior: &str,
        template: &CompiledTemplate,
    ) -> Result<String, SfcError> {
        let tmpl = self.env.get_template("component")?;
        Ok(tmpl.render(context! {
            behavior => behavior,
            render => &template.render,
            static_renders => &template.static_renders,
        })?)
    }

    /// The program that registers reusable components and mounts the demo.
    pub fn bootstrap(
        &self,
        demo: &str,
        reusable: &[String],
        demo_class: &str,
    ) -> Result<String, SfcError> {
        let tmpl = self.env.get_template("bootstrap")?;
        Ok(tmpl.render(context! {
            demo => demo,
            reusable => reusable,
            demo_class => js_string(demo_class),
        })?)
    }
}

impl Default for SourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

const COMPONENT_TEMPLATE: &str = r#"(function () {
  var component = (function () {
    {{ behavior | indent(4) }}
  })();
  component.render = {{ render | indent(2) }};
{% if static_renders %}
  component.staticRenderFns = [
    {{ static_renders | join(",\n") | indent(4) }}
  ];
{% else %}
  component.staticRenderFns = [];
{% endif %}
  return component;
})()"#;

const BOOTSTRAP_TEMPLATE: &str = r#"(function () {
  var tmp;
{% for module in reusable %}
  tmp = {{ module | indent(2) }};
  Vue.component(tmp.name, tmp);
{% endfor %}
  var DemoComponent = Vue.extend({{ demo | indent(2) }});
  var scripts = document.getElementsByTagName("script");
  var script = document.currentScript || scripts[scripts.length - 1];
  var anchor = script.previousElementSibling || script;
  var placeholder = document.createElement("div");
  placeholder.className = {{ demo_class }};
  var mount = document.createElement("div");
  placeholder.appendChild(mount);
  anchor.parentNode.insertBefore(placeholder, anchor);
  new DemoComponent().$mount(mount);
})();
"#;
