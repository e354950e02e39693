mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

const USERNAME: &str = "it_prof_user";
const PASSWORD: &str = "testpassword";

async fn authed_client(server: &common::TestServer) -> Result<(reqwest::Client, String)> {
    common::provision_user(USERNAME, PASSWORD).await?;
    let token = common::login(&server.base_url, USERNAME, PASSWORD).await?;
    Ok((reqwest::Client::new(), token))
}

#[tokio::test]
async fn professional_crud_round_trip() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let (client, token) = authed_client(server).await?;
    let base = &server.base_url;

    // Create
    let res = client
        .post(format!("{}/professionals/", base))
        .bearer_auth(&token)
        .json(&json!({ "name": "Enf. Registro", "council_id": "COREN/XX 1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = res.json::<Value>().await?;
    let id = created["id"].as_i64().context("id missing")?;
    assert_eq!(created["name"], "Enf. Registro");

    // Read
    let res = client
        .get(format!("{}/professionals/{}", base, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["council_id"], "COREN/XX 1");

    // List contains it
    let res = client
        .get(format!("{}/professionals/?limit=1000", base))
        .bearer_auth(&token)
        .send()
        .await?;
    let listed = res.json::<Vec<Value>>().await?;
    assert!(listed.iter().any(|p| p["id"] == id));

    // Update; council_id is optional and may be cleared
    let res = client
        .put(format!("{}/professionals/{}", base, id))
        .bearer_auth(&token)
        .json(&json!({ "name": "Enf. Renomeada", "council_id": null }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<Value>().await?;
    assert_eq!(updated["name"], "Enf. Renomeada");
    assert_eq!(updated["council_id"], Value::Null);

    // Delete returns 204 and the record is gone
    let res = client
        .delete(format!("{}/professionals/{}", base, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/professionals/{}", base, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Operations on a missing id are 404s
    let res = client
        .put(format!("{}/professionals/{}", base, id))
        .bearer_auth(&token)
        .json(&json!({ "name": "Fantasma", "council_id": null }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("{}/professionals/{}", base, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn deleting_professional_cascades_only_its_association() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let (client, token) = authed_client(server).await?;
    let base = &server.base_url;
    let code = 990101;

    let create_professional = |name: &str| {
        let client = client.clone();
        let token = token.clone();
        let body = json!({ "name": name, "council_id": null });
        let url = format!("{}/professionals/", base);
        async move {
            let res = client.post(url).bearer_auth(&token).json(&body).send().await?;
            anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed");
            res.json::<Value>().await?["id"].as_i64().context("id missing")
        }
    };
    let p1 = create_professional("Enf. Cascata").await?;
    let p2 = create_professional("Dr. Permanece").await?;

    let res = client
        .post(format!("{}/surgeries/", base))
        .bearer_auth(&token)
        .json(&json!({
            "surgery_code": code,
            "establishment_code": 1,
            "room": "Sala 2",
            "date": "2030-01-20",
            "start_time": "08:30:00",
            "status_code": "AG",
            "status_description": "Agendada",
            "patient_code": 2,
            "patient_name": "Paciente Cascata",
            "attendance_type": "Eletiva",
            "physician_code": 2,
            "physician_name": "Dr. Cascata",
            "physician_council_id": "CRM/XX 2",
            "procedure_description": "Teste de cascata",
            "team": [
                { "professional_id": p1, "role": "Auxiliar" },
                { "professional_id": p2, "role": "Anestesista" }
            ]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    // Removing one professional drops only its association row
    let res = client
        .delete(format!("{}/professionals/{}", base, p1))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/surgeries/{}", base, code))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let team = body["team"].as_array().context("team missing")?;
    assert_eq!(team.len(), 1);
    assert_eq!(team[0]["professional_id"], p2);
    assert_eq!(team[0]["role"], "Anestesista");

    // Cleanup
    client
        .delete(format!("{}/surgeries/{}", base, code))
        .bearer_auth(&token)
        .send()
        .await?;
    client
        .delete(format!("{}/professionals/{}", base, p2))
        .bearer_auth(&token)
        .send()
        .await?;
    Ok(())
}
