//! # Plugin Loader
//!
//! Evaluates a plugin source in its own context. The source may declare
//! namespaced commands, load further plugins and call native executor
//! constructors; its final value becomes the plugin's executor.

use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{native_executor, Executor, Plugin};
use crate::command::{canonical_command_name, Configurator};
use crate::loader::{ErrorDetail, Loader, LoaderError, LoaderResult};
use crate::registry::{Registry, RegistrySettings};
use crate::script::{CallArgs, Host, Interpreter, ScriptError, Value};

/// `git_helpers` -> `git-helpers`
pub fn namespace(name: &str) -> String {
    name.replace('_', "-")
}

/// Where a plugin comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSource {
    /// A bundled plugin, looked up by handle in the native plugin directory
    Native(String),
    /// A plugin file
    Path(PathBuf),
}

impl PluginSource {
    /// A name containing a path separator or an extension is a path;
    /// anything else is a native handle.
    pub fn parse(name: &str) -> Self {
        let name = name.trim().trim_start_matches(':');
        if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') || name.contains('.') {
            Self::Path(PathBuf::from(name))
        } else {
            Self::Native(name.to_string())
        }
    }

    /// The plugin name: the handle, or the file name up to its first `.`
    pub fn name(&self) -> String {
        match self {
            Self::Native(handle) => handle.clone(),
            Self::Path(path) => path
                .file_name()
                .map(|f| f.to_string_lossy())
                .and_then(|f| f.split('.').next().map(str::to_string))
                .unwrap_or_default(),
        }
    }

    pub fn resolve(&self, native_dir: &Path, extension: &str) -> PathBuf {
        match self {
            Self::Native(handle) => native_dir.join(format!("{}.{}", handle, extension)),
            Self::Path(path) => path.clone(),
        }
    }
}

impl From<&str> for PluginSource {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for PluginSource {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<PathBuf> for PluginSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for PluginSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

#[derive(Debug, Clone)]
pub struct PluginLoader {
    settings: RegistrySettings,
    /// Sources currently being loaded above this one
    ancestors: Vec<PathBuf>,
}

impl PluginLoader {
    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            settings,
            ancestors: Vec::new(),
        }
    }

    fn nested(&self, current: &Path) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(current.to_path_buf());
        Self {
            settings: self.settings.clone(),
            ancestors,
        }
    }
}

impl Loader for PluginLoader {
    type Input = PluginSource;

    fn new(registry: &Registry) -> Self {
        Self::with_settings(registry.settings().clone())
    }

    fn load(self, source: PluginSource) -> LoaderResult {
        let name = source.name();
        let path = source.resolve(&self.settings.native_plugin_dir, &self.settings.extension);
        info!("Loading plugin :{} from {}", name, path.display());

        let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if self.ancestors.contains(&key) {
            warn!("Plugin :{} is already being loaded", name);
            return LoaderResult::failed(LoaderError::PluginNotFound(ErrorDetail::new(format!(
                "circular plugin load of {}",
                path.display()
            ))));
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                warn!("Failed to read plugin :{}: {}", name, err);
                let detail = ErrorDetail::from_io(&path, &err);
                let error = match err.kind() {
                    ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                        LoaderError::PluginLoad(detail)
                    }
                    _ => LoaderError::PluginNotFound(detail),
                };
                return LoaderResult::failed(error);
            }
        };

        let interpreter = Interpreter::with_max_call_depth(self.settings.max_call_depth);
        let host = PluginHost {
            name: &name,
            loader: self.nested(&key),
            commands: RefCell::new(Vec::new()),
            result: RefCell::new(LoaderResult::new()),
        };

        let executor = match interpreter.eval_source(&content, &host) {
            Ok(value) => value,
            Err(err) => {
                warn!("Failed to evaluate plugin :{}: {}", name, err);
                return LoaderResult::failed(LoaderError::PluginNotFound(
                    ErrorDetail::from_script(&err).context(format!("plugin {}", name)),
                ));
            }
        };

        let commands = host.commands.into_inner();
        let mut result = host.result.into_inner();
        let executor = (!executor.is_nil()).then(|| Executor::new(executor));
        result.add_plugin(Plugin::new(name, executor, commands.clone()));
        result.commands.extend(commands);
        result
    }
}

/// Evaluation context of one plugin source
struct PluginHost<'a> {
    name: &'a str,
    loader: PluginLoader,
    commands: RefCell<Vec<crate::command::Command>>,
    result: RefCell<LoaderResult>,
}

impl PluginHost<'_> {
    fn command(&self, args: &CallArgs, interpreter: &Interpreter) {
        let outcome = args.str(0, "command name").and_then(|name| {
            let qualified = format!("{}:{}", namespace(self.name), canonical_command_name(&name));
            debug!("Loading command :{} from plugin {}", qualified, self.name);
            Configurator::new(interpreter).configure(&qualified, &args.get(1), self)
        });
        match outcome {
            Ok(command) => self.commands.borrow_mut().push(command),
            Err(err) => {
                warn!("Failed to configure command in plugin :{}: {}", self.name, err);
                self.result
                    .borrow_mut()
                    .add_error(LoaderError::PluginNotFound(ErrorDetail::from_script(&err)));
            }
        }
    }

    fn plugin(&self, args: &CallArgs) -> Result<(), ScriptError> {
        let source = PluginSource::parse(&args.str(0, "plugin name")?);
        let nested = self.loader.clone().load(source);
        self.result.borrow_mut().merge_plugins(nested);
        Ok(())
    }
}

impl Host for PluginHost<'_> {
    fn call(
        &self,
        name: &str,
        args: CallArgs,
        interpreter: &Interpreter,
    ) -> Result<Value, ScriptError> {
        match name {
            "command" => {
                self.command(&args, interpreter);
                Ok(Value::Nil)
            }
            "plugin" => {
                self.plugin(&args)?;
                Ok(Value::Nil)
            }
            _ => match native_executor(name) {
                Some(native) => Ok((native.build)()),
                None => Err(ScriptError::undefined_call(name)),
            },
        }
    }
}
