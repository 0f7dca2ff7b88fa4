//! Response bodies shared by the client, poller and CLI tests.

use serde_json::json;

pub fn pipeline_body(id: u64, status: &str) -> String {
    json!({
        "id": id,
        "project_id": 42,
        "status": status,
        "ref": "main",
        "source": "trigger",
        "sha": "a91957a858320c0e17f3a0eca7cfacbff50ea29a",
        "before_sha": "0000000000000000000000000000000000000000",
        "tag": false,
        "web_url": format!("https://gitlab.example.com/group/project/-/pipelines/{id}"),
        "created_at": "2024-05-04T10:15:30.123Z",
        "started_at": null,
        "finished_at": null,
        "coverage": null,
        "duration": null,
        "user": {
            "id": 7,
            "name": "Jane Doe",
            "username": "jdoe",
            "state": "active",
            "avatar_url": "https://gitlab.example.com/uploads/avatar.png",
            "web_url": "https://gitlab.example.com/jdoe"
        }
    })
    .to_string()
}
