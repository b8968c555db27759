use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Assistant persona selected for a session. Each mode maps to one fixed
/// system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    General,
    CodeAnalysis,
    CodeGenerator,
    Debugger,
    CodeGuide,
    Optimization,
    ExplainCode,
    ProjectBuilder,
    Documentation,
}

impl Mode {
    pub const ALL: [Mode; 9] = [
        Mode::General,
        Mode::CodeAnalysis,
        Mode::CodeGenerator,
        Mode::Debugger,
        Mode::CodeGuide,
        Mode::Optimization,
        Mode::ExplainCode,
        Mode::ProjectBuilder,
        Mode::Documentation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::CodeAnalysis => "Code Analysis",
            Self::CodeGenerator => "Code Generator",
            Self::Debugger => "Debugger",
            Self::CodeGuide => "Code Guide",
            Self::Optimization => "Optimization",
            Self::ExplainCode => "Explain Code",
            Self::ProjectBuilder => "Project Builder",
            Self::Documentation => "Documentation",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::CodeAnalysis => "code-analysis",
            Self::CodeGenerator => "code-generator",
            Self::Debugger => "debugger",
            Self::CodeGuide => "code-guide",
            Self::Optimization => "optimization",
            Self::ExplainCode => "explain-code",
            Self::ProjectBuilder => "project-builder",
            Self::Documentation => "documentation",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::General => {
                "You are a full-stack developer assistant. Help with any coding tasks."
            }
            Self::CodeAnalysis => {
                "You are an expert code analyst. Break down and explain code clearly."
            }
            Self::CodeGenerator => {
                "You are a senior developer. Generate high-quality, production-ready code."
            }
            Self::Debugger => {
                "You are a debugging assistant. Find issues, explain them, and suggest fixes."
            }
            Self::CodeGuide => "You are a mentor. Teach coding best practices step by step.",
            Self::Optimization => {
                "You are a performance engineer. Optimize code for speed and efficiency."
            }
            Self::ExplainCode => "You are a teacher. Explain code in simple terms with examples.",
            Self::ProjectBuilder => {
                "You are a full-stack developer. Build entire projects end-to-end."
            }
            Self::Documentation => {
                "You are a technical writer. Generate professional documentation."
            }
        }
    }

    /// Resolves a user-supplied name, falling back to [`Mode::General`] when the
    /// name is missing or not recognised.
    pub fn resolve(name: Option<&str>) -> Self {
        name.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(value);
        Mode::ALL
            .into_iter()
            .find(|mode| normalize(mode.label()) == wanted)
            .ok_or_else(|| format!("unknown mode '{}'", value.trim()))
    }
}

// "Code Analysis", "code-analysis" and "CODE_ANALYSIS" all compare equal.
fn normalize(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
