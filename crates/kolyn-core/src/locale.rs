use crate::audit::{CheckKind, CheckOutcome};
use crate::context::GenerateOutcome;
use crate::scaffold::{EntryKind, EntryState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User-facing language. Spanish is the default for fresh installs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    #[default]
    Es,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" | "1" => Ok(Locale::En),
            "es" | "español" | "spanish" | "2" => Ok(Locale::Es),
            other => Err(format!("unsupported language '{other}' (expected en or es)")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Locale::En => "en",
            Locale::Es => "es",
        })
    }
}

/// Fixed messages. Parameterised ones have dedicated methods on [`Locale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    SyncStart,
    SyncSuccess,
    NoSources,
    GlobalCreated,
    UsingGlobal,
    UsingLocal,
    RepoAccessError,
    CheckStart,
    NoPackageJson,
    NoSkills,
    Tip,
    InitTitle,
    AddSkillsHint,
    ScaffoldTitle,
    ScaffoldFixHint,
}

impl Locale {
    pub fn text(self, msg: Msg) -> &'static str {
        use Msg::*;
        match (self, msg) {
            (Locale::En, SyncStart) => "Starting synchronization...",
            (Locale::Es, SyncStart) => "Iniciando sincronización...",
            (Locale::En, SyncSuccess) => "Synchronization completed successfully.",
            (Locale::Es, SyncSuccess) => "Sincronización completada exitosamente.",
            (Locale::En, NoSources) => {
                "No skill sources configured. Use 'kolyn config init --source <url>' or 'kolyn config project --source <url>'."
            }
            (Locale::Es, NoSources) => {
                "No hay fuentes de skills configuradas. Usa 'kolyn config init --source <url>' o 'kolyn config project --source <url>'."
            }
            (Locale::En, GlobalCreated) => "Global configuration saved.",
            (Locale::Es, GlobalCreated) => "Configuración global guardada.",
            (Locale::En, UsingGlobal) => "Using global skills configuration.",
            (Locale::Es, UsingGlobal) => "Usando configuración global de skills.",
            (Locale::En, UsingLocal) => "Using local project configuration (.kolyn.json).",
            (Locale::Es, UsingLocal) => "Usando configuración local del proyecto (.kolyn.json).",
            (Locale::En, RepoAccessError) => {
                "Repository access error. If private, check your SSH keys or credentials."
            }
            (Locale::Es, RepoAccessError) => {
                "Error de acceso al repositorio. Si es privado, verifica tus llaves SSH o credenciales."
            }
            (Locale::En, CheckStart) => "Kolyn Check - Project Audit",
            (Locale::Es, CheckStart) => "Kolyn Check - Auditoría de Proyecto",
            (Locale::En, NoPackageJson) => "package.json not found. Dependency checks skipped.",
            (Locale::Es, NoPackageJson) => {
                "No se encontró package.json. Se omitirán chequeos de dependencias."
            }
            (Locale::En, NoSkills) => "No installed skills found to audit.",
            (Locale::Es, NoSkills) => "No hay skills instaladas para auditar.",
            (Locale::En, Tip) => "Tip",
            (Locale::Es, Tip) => "Consejo",
            (Locale::En, InitTitle) => "Kolyn init",
            (Locale::Es, InitTitle) => "Kolyn init - Inicialización de proyecto",
            (Locale::En, AddSkillsHint) => {
                "Add skills with 'kolyn init --skill <name>' (list them with 'kolyn skills')"
            }
            (Locale::Es, AddSkillsHint) => {
                "Agrega skills con 'kolyn init --skill <nombre>' (lístalas con 'kolyn skills')"
            }
            (Locale::En, ScaffoldTitle) => "Kolyn scaffold",
            (Locale::Es, ScaffoldTitle) => "Kolyn scaffold - Estructura de proyecto",
            (Locale::En, ScaffoldFixHint) => "Run again with --fix to create the missing entries.",
            (Locale::Es, ScaffoldFixHint) => {
                "Ejecuta de nuevo con --fix para crear las entradas faltantes."
            }
        }
    }

    pub fn installing_skills(self, url: &str) -> String {
        match self {
            Locale::En => format!("Installing skills from: {url}"),
            Locale::Es => format!("Instalando skills desde: {url}"),
        }
    }

    pub fn updating_skills(self, dir: &str) -> String {
        match self {
            Locale::En => format!("Updating skills at: {dir}"),
            Locale::Es => format!("Actualizando skills en: {dir}"),
        }
    }

    pub fn evaluating_skill(self, name: &str) -> String {
        match self {
            Locale::En => format!("Evaluating Skill: {name}"),
            Locale::Es => format!("Evaluando Skill: {name}"),
        }
    }

    pub fn audit_summary(self, total: usize, passed: usize, warnings: usize) -> String {
        match self {
            Locale::En => format!("Summary: {total} checks, {passed} passed, {warnings} warnings"),
            Locale::Es => {
                format!("Resumen: {total} verificaciones, {passed} pasadas, {warnings} alertas")
            }
        }
    }

    pub fn audit_issues(self, count: usize) -> String {
        match self {
            Locale::En => format!("{count} issues found during audit"),
            Locale::Es => format!("se encontraron {count} problemas en la auditoría"),
        }
    }

    pub fn missing_skill(self, reference: &str) -> String {
        match self {
            Locale::En => format!("Referenced skill not found: {reference}"),
            Locale::Es => format!("Skill referenciada no encontrada: {reference}"),
        }
    }

    pub fn project_overview(self, project_type: &str, active_skills: usize) -> String {
        match self {
            Locale::En => {
                format!("Project type: {project_type}  |  active skills: {active_skills}")
            }
            Locale::Es => {
                format!("Tipo de proyecto: {project_type}  |  skills activas: {active_skills}")
            }
        }
    }

    pub fn project_type(self, project_type: &str) -> String {
        let upper = project_type.to_uppercase();
        match self {
            Locale::En => format!("Project type: {upper}"),
            Locale::Es => format!("Tipo de proyecto: {upper}"),
        }
    }

    pub fn vendored(self, link: &str) -> String {
        match self {
            Locale::En => format!("vendored {link}"),
            Locale::Es => format!("copiada {link}"),
        }
    }

    pub fn agent_file(self, outcome: GenerateOutcome) -> &'static str {
        match (self, outcome) {
            (Locale::En, GenerateOutcome::Created) => "created: Agent.md",
            (Locale::En, GenerateOutcome::Updated) => "updated: Agent.md",
            (Locale::Es, GenerateOutcome::Created) => "creado: Agent.md",
            (Locale::Es, GenerateOutcome::Updated) => "actualizado: Agent.md",
        }
    }

    pub fn active_skills(self, count: usize) -> String {
        match self {
            Locale::En => format!("active skills: {count}"),
            Locale::Es => format!("skills activas: {count}"),
        }
    }

    pub fn checking_structure(self, dir: &str) -> String {
        match self {
            Locale::En => format!("Checking structure in {dir}"),
            Locale::Es => format!("Revisando estructura en {dir}"),
        }
    }

    pub fn running_command(self, command: &str) -> String {
        match self {
            Locale::En => format!("Running: {command}"),
            Locale::Es => format!("Ejecutando: {command}"),
        }
    }

    /// `exists: src/lib (directory)` and friends.
    pub fn structure_entry(self, state: EntryState, kind: EntryKind, path: &str) -> String {
        let en = self == Locale::En;
        let state = match (state, en) {
            (EntryState::Existing, true) => "exists",
            (EntryState::Created, true) => "created",
            (EntryState::Missing, true) => "missing",
            (EntryState::Existing, false) => "existe",
            (EntryState::Created, false) => "creado",
            (EntryState::Missing, false) => "falta",
        };
        let kind = match (kind, en) {
            (EntryKind::Directory, true) => "directory",
            (EntryKind::File, true) => "file",
            (EntryKind::Directory, false) => "directorio",
            (EntryKind::File, false) => "archivo",
        };
        format!("{state}: {path} ({kind})")
    }

    pub fn scaffold_missing(self, count: usize) -> String {
        match self {
            Locale::En => format!("{count} scaffold entries missing"),
            Locale::Es => format!("faltan {count} entradas del scaffold"),
        }
    }

    pub fn project_ready(self, name: &str) -> String {
        match self {
            Locale::En => format!("Project '{name}' ready"),
            Locale::Es => format!("Proyecto '{name}' listo"),
        }
    }

    /// One line describing a check result, without any status marker.
    pub fn describe_check(self, check: &CheckOutcome) -> String {
        let s = &check.subject;
        let en = self == Locale::En;
        match (check.kind, check.passed) {
            (CheckKind::RequiredDep, true) | (CheckKind::DepsAny, true) => {
                if en {
                    format!("Dependency found: {s}")
                } else {
                    format!("Dependencia encontrada: {s}")
                }
            }
            (CheckKind::RequiredDep, false) => {
                if en {
                    format!("Missing dependency: {s}")
                } else {
                    format!("Falta dependencia: {s}")
                }
            }
            (CheckKind::DepsAny, false) => {
                if en {
                    format!("Missing dependency (at least one of): {s}")
                } else {
                    format!("Falta dependencia (al menos una de): {s}")
                }
            }
            (CheckKind::ForbiddenDep, true) => {
                if en {
                    format!("Forbidden dependency absent: {s}")
                } else {
                    format!("Dependencia prohibida ausente: {s}")
                }
            }
            (CheckKind::ForbiddenDep, false) => {
                if en {
                    format!("Forbidden dependency detected: {s}")
                } else {
                    format!("Dependencia prohibida detectada: {s}")
                }
            }
            (CheckKind::File, true) | (CheckKind::FilesAny, true) => {
                if en {
                    format!("File found: {s}")
                } else {
                    format!("Archivo encontrado: {s}")
                }
            }
            (CheckKind::File, false) => {
                if en {
                    format!("Missing file: {s}")
                } else {
                    format!("Falta archivo: {s}")
                }
            }
            (CheckKind::FilesAny, false) => {
                if en {
                    format!("Missing file (at least one of): {s}")
                } else {
                    format!("Falta archivo (al menos uno de): {s}")
                }
            }
            (CheckKind::EnvVar, true) => {
                if en {
                    format!("Env var found: {s}")
                } else {
                    format!("Variable de entorno encontrada: {s}")
                }
            }
            (CheckKind::EnvVar, false) => {
                if en {
                    format!("Missing env var: {s}")
                } else {
                    format!("Falta variable de entorno: {s}")
                }
            }
        }
    }
}
