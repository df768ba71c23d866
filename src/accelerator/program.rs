use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Kernel sources shipped with the crate, in compilation order
const EMBEDDED_SOURCES: [(&str, &str); 3] = [
    ("00_records.glsl", include_str!("../../kernels/00_records.glsl")),
    ("10_sampling.glsl", include_str!("../../kernels/10_sampling.glsl")),
    ("20_render.glsl", include_str!("../../kernels/20_render.glsl")),
];

const SOURCE_EXTENSIONS: [&str; 2] = ["glsl", "comp"];

/// Entry point of the render kernel
pub const ENTRY_POINT: &str = "main";

/// The kernel sources, concatenated in file name order into a single compilation unit
#[derive(Debug, Clone)]
pub struct ProgramSources {
    files: Vec<(String, String)>,
}

impl ProgramSources {
    pub fn embedded() -> Self {
        Self {
            files: EMBEDDED_SOURCES
                .iter()
                .map(|(name, src)| (name.to_string(), src.to_string()))
                .collect(),
        }
    }

    /// Read every `.glsl` and `.comp` file of `dir`, sorted by file name
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read_err = |path: &Path, err: std::io::Error| {
            Error::AcceleratorInit(format!("{}: {err}", path.display()))
        };

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|err| read_err(dir, err))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| {
                        SOURCE_EXTENSIONS
                            .iter()
                            .any(|wanted| ext.eq_ignore_ascii_case(wanted))
                    })
                    .unwrap_or(false)
            })
            .collect();

        if paths.is_empty() {
            return Err(Error::AcceleratorInit(format!(
                "no kernel sources found in {}",
                dir.display()
            )));
        }
        paths.sort();

        let files = paths
            .into_iter()
            .map(|path| {
                let src = std::fs::read_to_string(&path).map_err(|err| read_err(&path, err))?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok((name, src))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { files })
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(name, _)| name.as_str())
    }

    /// Single source string handed to the compiler
    pub fn concatenated(&self) -> String {
        let mut out = String::new();
        for (name, src) in &self.files {
            // Preprocessor lines must not follow another file's last line
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&format!("// ---- {name}\n"));
            out.push_str(src);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimization {
    Zero,
    Size,
    Performance,
}

/// Compiler flags, parsed from a `glslc`-like option string.
///
/// Recognized flags are `-DNAME`, `-DNAME=VALUE` (or with a space after `-D`), `-O`, `-O0`,
/// `-Os`, `-g`, `-w` and `-Werror`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub defines: Vec<(String, Option<String>)>,
    pub optimization: Option<Optimization>,
    pub debug_info: bool,
    pub suppress_warnings: bool,
    pub warnings_as_errors: bool,
}

impl BuildOptions {
    pub fn parse(options: &str) -> Result<Self> {
        let mut this = Self::default();
        let mut tokens = options.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                "-O" => this.optimization = Some(Optimization::Performance),
                "-O0" => this.optimization = Some(Optimization::Zero),
                "-Os" => this.optimization = Some(Optimization::Size),
                "-g" => this.debug_info = true,
                "-w" => this.suppress_warnings = true,
                "-Werror" => this.warnings_as_errors = true,
                "-D" => {
                    let define = tokens.next().ok_or_else(|| {
                        Error::AcceleratorInit("build option -D expects a macro name".to_owned())
                    })?;
                    this.define(define)?;
                }
                _ => match token.strip_prefix("-D") {
                    Some(define) => this.define(define)?,
                    None => {
                        return Err(Error::AcceleratorInit(format!(
                            "unrecognized build option {token:?}"
                        )))
                    }
                },
            }
        }
        Ok(this)
    }

    fn define(&mut self, define: &str) -> Result<()> {
        let (name, value) = match define.split_once('=') {
            Some((name, value)) => (name, Some(value.to_owned())),
            None => (define, None),
        };
        if name.is_empty() {
            return Err(Error::AcceleratorInit(format!(
                "empty macro name in -D{define}"
            )));
        }
        self.defines.push((name.to_owned(), value));
        Ok(())
    }

    pub fn with_define(mut self, name: &str, value: impl ToString) -> Self {
        self.defines.push((name.to_owned(), Some(value.to_string())));
        self
    }
}
