//! Postgres-backed flows. Run with `TEST_DATABASE_URL` pointing at a
//! scratch database; skipped otherwise.

use chrono::Utc;
use sqlx::PgPool;
use ufc_core::scoring::Resultado;
use ufc_core::{ComentarioStatus, ConteudoTipo, EventoTipo, LutaStatus, NoticiaCategoria, REPORT_THRESHOLD};
use ufc_storage::db::{self, analises, comentarios, eventos, lutadores, lutas, noticias, previsoes, ranking};
use ufc_sync::{maintenance, results};
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = db::connect(&url).await.expect("connect to TEST_DATABASE_URL");
    db::migrate(&pool).await.expect("migrations");
    Some(pool)
}

fn tag() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

async fn seed_card(pool: &PgPool) -> (ufc_core::Evento, ufc_core::Lutador, ufc_core::Lutador, ufc_core::Luta) {
    let t = tag();
    let evento = eventos::insert(
        pool,
        &eventos::NovoEvento {
            nome: format!("UFC Teste {t}"),
            slug: format!("ufc-fight-night-teste-{t}"),
            ufc_slug: None,
            local: None,
            cidade: None,
            pais: None,
            data: Utc::now(),
            status: None,
            tipo: None,
            poster_url: None,
        },
        EventoTipo::FightNight,
    )
    .await
    .unwrap();
    let mut seeded = Vec::new();
    for nome in ["Lutador Um", "Lutador Dois"] {
        let novo = lutadores::NovoLutador {
            nome: nome.into(),
            apelido: None,
            slug: None,
            categoria_peso: Some("Peso-médio".into()),
            vitorias: 0,
            derrotas: 0,
            empates: 0,
            pais: None,
            ranking: None,
            imagem_url: None,
        };
        let slug = format!("{}-{t}", ufc_core::slug::slugify(nome));
        seeded.push(lutadores::insert(pool, &novo, &slug).await.unwrap());
    }
    let l2 = seeded.pop().unwrap();
    let l1 = seeded.pop().unwrap();
    let luta = lutas::insert(
        pool,
        &lutas::NovaLuta {
            evento_id: evento.id,
            lutador1_id: l1.id,
            lutador2_id: l2.id,
            categoria_peso: None,
            ordem: 1,
            is_main_event: true,
            is_titulo: false,
        },
    )
    .await
    .unwrap();
    (evento, l1, l2, luta)
}

#[tokio::test]
async fn report_flips_status_exactly_at_threshold() {
    let Some(pool) = test_pool().await else { return };
    let comentario = comentarios::insert(
        &pool,
        &comentarios::NovoComentario {
            conteudo_tipo: ConteudoTipo::Noticia,
            conteudo_id: Uuid::new_v4(),
            autor_nome: "Ana".into(),
            texto: "spam".into(),
            fingerprint: None,
        },
    )
    .await
    .unwrap();

    for n in 1..REPORT_THRESHOLD {
        let c = comentarios::report(&pool, comentario.id, REPORT_THRESHOLD).await.unwrap().unwrap();
        assert_eq!(c.reportado_count, n);
        assert_eq!(c.status, ComentarioStatus::Aprovado);
    }
    let c = comentarios::report(&pool, comentario.id, REPORT_THRESHOLD).await.unwrap().unwrap();
    assert_eq!(c.status, ComentarioStatus::Rejeitado);
    let c = comentarios::report(&pool, comentario.id, REPORT_THRESHOLD).await.unwrap().unwrap();
    assert_eq!(c.status, ComentarioStatus::Rejeitado);
    assert_eq!(c.reportado_count, REPORT_THRESHOLD + 1);

    assert!(comentarios::report(&pool, Uuid::new_v4(), REPORT_THRESHOLD).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_reports_are_all_counted() {
    let Some(pool) = test_pool().await else { return };
    let comentario = comentarios::insert(
        &pool,
        &comentarios::NovoComentario {
            conteudo_tipo: ConteudoTipo::Evento,
            conteudo_id: Uuid::new_v4(),
            autor_nome: "Bia".into(),
            texto: "texto".into(),
            fingerprint: None,
        },
    )
    .await
    .unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move { comentarios::report(&pool, comentario.id, 100).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    let c = comentarios::report(&pool, comentario.id, 100).await.unwrap().unwrap();
    assert_eq!(c.reportado_count, 11);
}

#[tokio::test]
async fn comment_targets_are_checked_per_kind() {
    let Some(pool) = test_pool().await else { return };
    let (evento, _, _, _) = seed_card(&pool).await;
    assert!(comentarios::target_exists(&pool, ConteudoTipo::Evento, evento.id).await.unwrap());
    assert!(!comentarios::target_exists(&pool, ConteudoTipo::Noticia, evento.id).await.unwrap());
    assert!(!comentarios::target_exists(&pool, ConteudoTipo::Analise, Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn deleting_news_removes_its_comments() {
    let Some(pool) = test_pool().await else { return };
    let noticia = noticias::insert_if_new(
        &pool,
        &noticias::NovaNoticia {
            titulo: "Card de Las Vegas fechado".into(),
            subtitulo: None,
            conteudo: None,
            imagem_url: None,
            fonte_url: format!("https://example.com/card-{}", tag()),
            fonte_nome: None,
            categoria: NoticiaCategoria::Eventos,
            publicado_em: None,
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert!(comentarios::target_exists(&pool, ConteudoTipo::Noticia, noticia.id).await.unwrap());
    comentarios::insert(
        &pool,
        &comentarios::NovoComentario {
            conteudo_tipo: ConteudoTipo::Noticia,
            conteudo_id: noticia.id,
            autor_nome: "Caio".into(),
            texto: "Vai ser guerra".into(),
            fingerprint: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(noticias::delete_many(&pool, &[noticia.id]).await.unwrap(), 1);
    let left = comentarios::list_visible(&pool, ConteudoTipo::Noticia, noticia.id).await.unwrap();
    assert!(left.is_empty());
    assert!(!comentarios::target_exists(&pool, ConteudoTipo::Noticia, noticia.id).await.unwrap());
}

#[tokio::test]
async fn viewing_news_counts_once_per_fetch() {
    let Some(pool) = test_pool().await else { return };
    let nova = noticias::NovaNoticia {
        titulo: "UFC 320 confirmado".into(),
        subtitulo: None,
        conteudo: None,
        imagem_url: None,
        fonte_url: format!("https://example.com/{}", tag()),
        fonte_nome: None,
        categoria: NoticiaCategoria::Eventos,
        publicado_em: None,
    };
    let noticia = noticias::insert_if_new(&pool, &nova).await.unwrap().unwrap();
    assert!(noticias::insert_if_new(&pool, &nova).await.unwrap().is_none());

    let first = noticias::view(&pool, noticia.id).await.unwrap().unwrap();
    let second = noticias::view(&pool, noticia.id).await.unwrap().unwrap();
    assert_eq!(first.visualizacoes, noticia.visualizacoes + 1);
    assert_eq!(second.visualizacoes, noticia.visualizacoes + 2);
    assert!(noticias::view(&pool, Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_an_event_leaves_no_orphans() {
    let Some(pool) = test_pool().await else { return };
    let (evento, l1, l2, luta) = seed_card(&pool).await;
    let fingerprint = format!("fp-{}", tag());
    previsoes::upsert(
        &pool,
        &previsoes::NovaPrevisao {
            luta_id: luta.id,
            fingerprint: fingerprint.clone(),
            vencedor_previsto_id: l1.id,
            metodo_previsto: None,
            round_previsto: None,
        },
    )
    .await
    .unwrap();
    let resultado = Resultado {
        vencedor_id: l1.id,
        metodo: None,
        round: None,
    };
    results::record_result(&pool, luta.id, &resultado, None).await.unwrap();
    let top = ranking::top(&pool, 1000).await.unwrap();
    assert!(top.iter().any(|r| r.fingerprint == fingerprint && r.pontos == 10));
    let analise = analises::insert(
        &pool,
        &analises::NovaAnalise {
            slug: format!("analise-{}", tag()),
            titulo: "Análise".into(),
            evento_id: Some(evento.id),
            lutador1_id: l1.id,
            lutador2_id: l2.id,
            resumo: None,
            breakdown: serde_json::json!({}),
            previsao: serde_json::json!({}),
            autor: None,
            publicado_em: None,
        },
    )
    .await
    .unwrap();

    let summary = maintenance::delete_event(&pool, &evento.slug).await.unwrap().unwrap();
    assert_eq!(summary.lutas, 1);
    assert_eq!(summary.previsoes, 1);
    assert_eq!(summary.eventos, 1);
    assert_eq!(summary.rankings_atualizados, 1);
    let top = ranking::top(&pool, 1000).await.unwrap();
    assert!(top.iter().all(|r| r.fingerprint != fingerprint));

    assert!(lutas::find(&pool, luta.id).await.unwrap().is_none());
    assert!(eventos::find_by_slug(&pool, &evento.slug).await.unwrap().is_none());
    let detached = analises::find_by_slug(&pool, &analise.slug).await.unwrap().unwrap();
    assert_eq!(detached.evento_id, None);
    assert!(maintenance::delete_event(&pool, &evento.slug).await.unwrap().is_none());
}

#[tokio::test]
async fn recording_a_result_scores_predictions_and_ranking() {
    let Some(pool) = test_pool().await else { return };
    let (_, l1, l2, luta) = seed_card(&pool).await;
    let certeiro = format!("fp-{}", tag());
    let errado = format!("fp-{}", tag());
    for (fingerprint, vencedor) in [(&certeiro, l1.id), (&errado, l2.id)] {
        previsoes::upsert(
            &pool,
            &previsoes::NovaPrevisao {
                luta_id: luta.id,
                fingerprint: fingerprint.clone(),
                vencedor_previsto_id: vencedor,
                metodo_previsto: Some("KO/TKO".into()),
                round_previsto: Some(2),
            },
        )
        .await
        .unwrap();
    }

    let resultado = Resultado {
        vencedor_id: l1.id,
        metodo: Some("TKO (socos)".into()),
        round: Some(2),
    };
    let registrado = results::record_result(&pool, luta.id, &resultado, Some("3:12")).await.unwrap();
    assert_eq!(registrado.luta.status, LutaStatus::Finalizada);
    assert_eq!(registrado.previsoes_pontuadas, 2);

    let top = ranking::top(&pool, 1000).await.unwrap();
    let row = top.iter().find(|r| r.fingerprint == certeiro).unwrap();
    assert_eq!(row.pontos, 20);
    assert_eq!(row.acertos, 1);
    assert!((row.precisao - 1.0).abs() < f64::EPSILON);
    let row = top.iter().find(|r| r.fingerprint == errado).unwrap();
    assert_eq!(row.pontos, 0);

    let outsider = Resultado {
        vencedor_id: Uuid::new_v4(),
        metodo: None,
        round: None,
    };
    assert!(matches!(
        results::record_result(&pool, luta.id, &outsider, None).await,
        Err(results::ResultError::InvalidWinner)
    ));
}
