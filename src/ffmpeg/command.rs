use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Output target meaning "write to standard output".
pub const STDOUT: &str = "-";
/// Input path meaning "read from standard input".
pub const STDIN: &str = "pipe:0";

#[derive(Debug, Clone)]
struct Input {
    path: OsString,
    pre_args: Vec<OsString>,
}

/// Builder for an ffmpeg-style invocation.
///
/// Inputs are numbered in the order they're added, and `-map`/`-map_metadata`
/// refer to those numbers, so add inputs in the order you reference them.
#[derive(Debug, Clone)]
pub struct CommandLine {
    program: PathBuf,
    global: Vec<OsString>,
    inputs: Vec<Input>,
    format: Option<String>,
    args: Vec<OsString>,
    overwrite: bool,
    output: Option<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            global: vec!["-v".into(), "error".into()],
            inputs: Vec::new(),
            format: None,
            args: Vec::new(),
            overwrite: false,
            output: None,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Container format of the output (`-f`).
    pub fn set_format(&mut self, format: impl Into<String>) -> &mut Self {
        self.format = Some(format.into());
        self
    }

    pub fn add_args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Add an input and return its index.
    pub fn add_input(&mut self, path: impl AsRef<OsStr>) -> usize {
        self.add_input_with(path, &[])
    }

    /// Add an input preceded by input-specific flags, e.g. a raw PCM layout.
    pub fn add_input_with(&mut self, path: impl AsRef<OsStr>, pre_args: &[&str]) -> usize {
        self.inputs.push(Input {
            path: path.as_ref().to_os_string(),
            pre_args: pre_args.iter().map(OsString::from).collect(),
        });
        self.inputs.len() - 1
    }

    /// Add an input and map its stream `stream` into the output.
    pub fn add_mapped_input(&mut self, path: impl AsRef<OsStr>, stream: usize) -> usize {
        let index = self.add_input(path);
        self.add_map(index, stream);
        index
    }

    pub fn add_map(&mut self, input: usize, stream: usize) -> &mut Self {
        self.add_args(["-map".to_string(), format!("{input}:{stream}")])
    }

    /// Add an input whose global metadata and chapters are copied to the output.
    pub fn add_metadata_input(&mut self, path: impl AsRef<OsStr>) -> usize {
        let index = self.add_input(path);
        self.add_args(["-map_metadata".to_string(), index.to_string()]);
        index
    }

    /// Add cover art mapped into the output alongside stream `stream`.
    pub fn add_album_art(&mut self, art: impl AsRef<OsStr>, stream: usize) -> usize {
        let index = self.add_mapped_input(art, stream);
        self.add_args([
            "-id3v2_version",
            "3",
            "-metadata:s:v",
            "title=Album cover",
            "-metadata:s:v",
            "comment=Cover (front)",
        ]);
        index
    }

    pub fn set_output(&mut self, target: impl AsRef<OsStr>, overwrite: bool) -> &mut Self {
        self.output = Some(target.as_ref().to_os_string());
        self.overwrite = overwrite;
        self
    }

    /// Arguments in the order the tool expects, without the program name.
    pub fn args(&self) -> Vec<OsString> {
        let mut cl = self.global.clone();

        for input in &self.inputs {
            cl.extend(input.pre_args.iter().cloned());
            cl.push("-i".into());
            cl.push(input.path.clone());
        }

        if let Some(format) = &self.format {
            cl.push("-f".into());
            cl.push(format.into());
        }

        cl.extend(self.args.iter().cloned());

        if self.overwrite {
            cl.push("-y".into());
        }
        if let Some(output) = &self.output {
            cl.push(output.clone());
        }
        cl
    }

    /// The full command line, program first.
    pub fn get_cmdline(&self) -> Vec<OsString> {
        let mut cl = vec![self.program.as_os_str().to_os_string()];
        cl.extend(self.args());
        cl
    }

    pub fn to_command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(self.args());
        command
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self
            .get_cmdline()
            .iter()
            .map(|a| format!("'{}'", a.to_string_lossy()))
            .collect();
        write!(f, "{}", quoted.join(" "))
    }
}
