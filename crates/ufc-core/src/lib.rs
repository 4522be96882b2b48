//! Core domain model for the UFC news site: events, fighters, fights, news,
//! analyses, fan predictions and comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

pub mod images;
pub mod scoring;
pub mod slug;
pub mod text;

pub const CRATE_NAME: &str = "ufc-core";

/// Number of reports after which a comment is hidden.
pub const REPORT_THRESHOLD: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Closed string enums stored as TEXT columns.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

text_enum!(EventoStatus, "evento status" {
    Agendado => "agendado",
    AoVivo => "ao_vivo",
    Finalizado => "finalizado",
});

text_enum!(EventoTipo, "evento tipo" {
    Ppv => "PPV",
    FightNight => "Fight Night",
});

text_enum!(LutaStatus, "luta status" {
    Agendada => "agendada",
    Finalizada => "finalizada",
    Cancelada => "cancelada",
});

text_enum!(
    /// Fixed category set; drives the per-tab counts on the news page.
    NoticiaCategoria, "noticia categoria" {
    Eventos => "eventos",
    Lutadores => "lutadores",
    Resultados => "resultados",
    Rumores => "rumores",
    Entrevistas => "entrevistas",
    Geral => "geral",
});

text_enum!(ComentarioStatus, "comentario status" {
    Pendente => "pendente",
    Aprovado => "aprovado",
    Rejeitado => "rejeitado",
});

text_enum!(ConteudoTipo, "conteudo tipo" {
    Noticia => "noticia",
    Analise => "analise",
    Evento => "evento",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Evento {
    pub id: Uuid,
    pub nome: String,
    pub slug: String,
    pub ufc_slug: Option<String>,
    pub local: Option<String>,
    pub cidade: Option<String>,
    pub pais: Option<String>,
    pub data: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub status: EventoStatus,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub tipo: EventoTipo,
    pub poster_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Lutador {
    pub id: Uuid,
    pub nome: String,
    pub apelido: Option<String>,
    pub slug: String,
    pub categoria_peso: Option<String>,
    pub vitorias: i32,
    pub derrotas: i32,
    pub empates: i32,
    pub pais: Option<String>,
    pub ranking: Option<i32>,
    pub imagem_url: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Luta {
    pub id: Uuid,
    pub evento_id: Uuid,
    pub lutador1_id: Uuid,
    pub lutador2_id: Uuid,
    pub categoria_peso: Option<String>,
    pub ordem: i32,
    pub is_main_event: bool,
    pub is_titulo: bool,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub status: LutaStatus,
    pub vencedor_id: Option<Uuid>,
    pub metodo: Option<String>,
    pub round: Option<i32>,
    pub tempo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fight on an event card, with both fighters' display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LutaCard {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub luta: Luta,
    pub lutador1_nome: String,
    pub lutador2_nome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Noticia {
    pub id: Uuid,
    pub titulo: String,
    pub subtitulo: Option<String>,
    pub conteudo: Option<String>,
    pub imagem_url: Option<String>,
    pub fonte_url: String,
    pub fonte_nome: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub categoria: NoticiaCategoria,
    pub publicado_em: DateTime<Utc>,
    pub visualizacoes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Analise {
    pub id: Uuid,
    pub slug: String,
    pub titulo: String,
    pub evento_id: Option<Uuid>,
    pub lutador1_id: Uuid,
    pub lutador2_id: Uuid,
    pub resumo: Option<String>,
    /// Opaque editorial payloads; stored as JSONB and passed through untouched.
    pub breakdown: JsonValue,
    pub previsao: JsonValue,
    pub autor: Option<String>,
    pub publicado_em: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Previsao {
    pub id: Uuid,
    pub luta_id: Uuid,
    pub fingerprint: String,
    pub vencedor_previsto_id: Uuid,
    pub metodo_previsto: Option<String>,
    pub round_previsto: Option<i32>,
    pub pontos: Option<i32>,
    pub acertou: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RankingPrevisor {
    pub fingerprint: String,
    pub apelido: Option<String>,
    pub pontos: i64,
    pub total_previsoes: i64,
    pub acertos: i64,
    pub precisao: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Comentario {
    pub id: Uuid,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub conteudo_tipo: ConteudoTipo,
    pub conteudo_id: Uuid,
    pub autor_nome: String,
    pub texto: String,
    #[serde(skip_serializing, default)]
    pub fingerprint: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub status: ComentarioStatus,
    pub reportado_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comentario {
    pub fn is_visible(&self) -> bool {
        self.status == ComentarioStatus::Aprovado
    }
}

/// Admin account used for the write endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Usuario {
    pub id: Uuid,
    pub email: String,
    pub nome: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Parsed news item handed from adapters to the sync pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticiaDraft {
    pub source_id: String,
    pub fonte_nome: Option<String>,
    pub titulo: Option<String>,
    pub subtitulo: Option<String>,
    pub conteudo: Option<String>,
    pub imagem_url: Option<String>,
    pub fonte_url: Option<String>,
    pub publicado_em: Option<DateTime<Utc>>,
    #[serde(default)]
    pub feed_categorias: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventoDraft {
    pub source_id: String,
    pub nome: String,
    pub slug: String,
    pub data: Option<DateTime<Utc>>,
    pub local: Option<String>,
    pub cidade: Option<String>,
    pub pais: Option<String>,
    pub status: EventoStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LutadorDraft {
    pub source_id: String,
    pub nome: String,
    pub apelido: Option<String>,
    pub slug: String,
    pub categoria_peso: Option<String>,
    pub vitorias: i32,
    pub derrotas: i32,
    pub empates: i32,
    pub pais: Option<String>,
    pub ranking: Option<i32>,
}
