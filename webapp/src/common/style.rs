pub const BOOTH_STYLES: &str = r#"
body {
    margin: 0;
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background-color: #fdf6f0;
    color: #2d3436;
}

.container {
    max-width: 960px;
    margin: 0 auto;
    padding: 24px;
}

.section-title {
    text-align: center;
    color: #e17055;
}

.booth {
    display: flex;
    flex-direction: column;
    align-items: center;
    gap: 12px;
}

.booth video,
.booth img {
    width: 640px;
    max-width: 100%;
    border-radius: 8px;
    background-color: #2d3436;
}

.booth-controls {
    display: flex;
    gap: 12px;
}

.btn {
    padding: 10px 20px;
    border: none;
    border-radius: 6px;
    font-size: 16px;
    cursor: pointer;
    background-color: #e17055;
    color: white;
}

.btn:disabled {
    background-color: #b2bec3;
    cursor: not-allowed;
}

.btn-secondary {
    background-color: #636e72;
}

.gallery-status {
    text-align: center;
    color: #636e72;
}

.gallery-grid {
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(200px, 1fr));
    gap: 12px;
    margin-top: 24px;
}

.gallery-grid img {
    width: 100%;
    border-radius: 6px;
}
"#;
