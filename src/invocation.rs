use std::fmt::Display;
use std::path::Path;

pub const CC_DEFINE: &str = "-D__CC=";
pub const BUILD_DIR_DEFINE: &str = "-D__BUILD_DIR";

#[derive(PartialEq, Eq, Debug)]
pub enum InvocationError {
    MissingSource,
    MissingCompiler,
    InvalidCompiler(String),
    MissingBuildDir,
}

impl Display for InvocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationError::MissingSource => write!(f, "no argument names a .c source file"),
            InvocationError::MissingCompiler => write!(f, "missing {CC_DEFINE}<compiler> argument"),
            InvocationError::InvalidCompiler(cc) => {
                write!(f, "cannot split compiler command `{cc}` into words")
            }
            InvocationError::MissingBuildDir => {
                write!(f, "missing {BUILD_DIR_DEFINE}=<dir> argument")
            }
        }
    }
}

impl std::error::Error for InvocationError {}

/// A compiler command line with the wrapper's own defines resolved and the
/// source argument pointed at the converted copy.
#[derive(PartialEq, Eq, Debug)]
pub struct Invocation {
    pub source: String,
    pub compiler: String,
    pub build_dir: String,
    pub output: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn parse(mut args: Vec<String>) -> Result<Invocation, InvocationError> {
        let index = find_source(&args).ok_or(InvocationError::MissingSource)?;
        let source = args[index].clone();

        let compiler = args
            .iter()
            .find_map(|a| a.strip_prefix(CC_DEFINE))
            .ok_or(InvocationError::MissingCompiler)?
            .to_owned();
        if compiler_words(&compiler).map_or(true, |w| w.is_empty()) {
            return Err(InvocationError::InvalidCompiler(compiler));
        }

        let build_dir = args
            .iter()
            .find_map(|a| a.strip_prefix(BUILD_DIR_DEFINE))
            .map(|d| d.strip_prefix('=').unwrap_or(d))
            .filter(|d| !d.is_empty())
            .ok_or(InvocationError::MissingBuildDir)?
            .to_owned();

        let output = format!("{build_dir}/{source}");

        // Replace by value so only the first occurrence changes.
        if let Some(first) = args.iter().position(|a| *a == source) {
            args[first] = output.clone();
        }

        Ok(Invocation {
            source,
            compiler,
            build_dir,
            output,
            args,
        })
    }

    /// The compiler string split into a program and its leading arguments.
    pub fn compiler_words(&self) -> Vec<String> {
        compiler_words(&self.compiler).unwrap_or_default()
    }
}

fn compiler_words(compiler: &str) -> Option<Vec<String>> {
    shlex::split(compiler)
}

fn is_wrapper_define(arg: &str) -> bool {
    arg.starts_with(CC_DEFINE) || arg.starts_with(BUILD_DIR_DEFINE)
}

fn find_source(args: &[String]) -> Option<usize> {
    let candidates = || {
        args.iter()
            .enumerate()
            .filter(|(_, a)| !is_wrapper_define(a) && a.contains(".c"))
    };

    candidates()
        .find(|(_, a)| Path::new(a.as_str()).extension().is_some_and(|e| e == "c"))
        .or_else(|| candidates().next())
        .map(|(i, _)| i)
}
