/// SQL schema for the Shore Connect database
/// Creates all tables with proper constraints, foreign keys, and indexes
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password TEXT NOT NULL,
    bio TEXT,
    location TEXT,
    profilePictureUrl TEXT,
    createdAt TEXT NOT NULL,
    updatedAt TEXT NOT NULL
);

-- Cleanup events
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    eventName TEXT NOT NULL,
    description TEXT,
    date TEXT NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    address TEXT,
    organizerId TEXT NOT NULL,
    createdAt TEXT NOT NULL,
    updatedAt TEXT NOT NULL,
    FOREIGN KEY (organizerId) REFERENCES users(id) ON DELETE CASCADE
);

-- Event attendees (one row per RSVP)
CREATE TABLE IF NOT EXISTS event_attendees (
    eventId TEXT NOT NULL,
    userId TEXT NOT NULL,
    joinedAt TEXT NOT NULL,
    PRIMARY KEY (eventId, userId),
    FOREIGN KEY (eventId) REFERENCES events(id) ON DELETE CASCADE,
    FOREIGN KEY (userId) REFERENCES users(id) ON DELETE CASCADE
);

-- Posts table (optionally attached to an event)
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    imageUrl TEXT,
    authorId TEXT NOT NULL,
    eventId TEXT,
    createdAt TEXT NOT NULL,
    updatedAt TEXT NOT NULL,
    FOREIGN KEY (authorId) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (eventId) REFERENCES events(id) ON DELETE SET NULL
);

-- Post likes
CREATE TABLE IF NOT EXISTS post_likes (
    postId TEXT NOT NULL,
    userId TEXT NOT NULL,
    likedAt TEXT NOT NULL,
    PRIMARY KEY (postId, userId),
    FOREIGN KEY (postId) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (userId) REFERENCES users(id) ON DELETE CASCADE
);

-- Comments table
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    postId TEXT NOT NULL,
    authorId TEXT NOT NULL,
    text TEXT NOT NULL,
    createdAt TEXT NOT NULL,
    FOREIGN KEY (postId) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (authorId) REFERENCES users(id) ON DELETE CASCADE
);

-- Follows table (one-way relationships)
CREATE TABLE IF NOT EXISTS user_follows (
    followerId TEXT NOT NULL,
    followingId TEXT NOT NULL,
    followedAt TEXT NOT NULL,
    PRIMARY KEY (followerId, followingId),
    FOREIGN KEY (followerId) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (followingId) REFERENCES users(id) ON DELETE CASCADE
);

-- Debris hotspots (pre-loaded survey data, no spatial index)
CREATE TABLE IF NOT EXISTS debris_hotspots (
    id TEXT PRIMARY KEY,
    location TEXT NOT NULL,
    debrisScore REAL NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    description TEXT,
    createdAt TEXT NOT NULL
);

-- Bearer sessions
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    userId TEXT NOT NULL,
    createdAt TEXT NOT NULL,
    expiresAt TEXT NOT NULL,
    FOREIGN KEY (userId) REFERENCES users(id) ON DELETE CASCADE
);

-- Indexes for efficient lookups
CREATE INDEX IF NOT EXISTS idx_events_organizer ON events(organizerId);
CREATE INDEX IF NOT EXISTS idx_events_date ON events(date);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(authorId);
CREATE INDEX IF NOT EXISTS idx_posts_event ON posts(eventId);
CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(createdAt DESC);
CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(postId);
CREATE INDEX IF NOT EXISTS idx_event_attendees_user ON event_attendees(userId);
CREATE INDEX IF NOT EXISTS idx_user_follows_follower ON user_follows(followerId);
CREATE INDEX IF NOT EXISTS idx_user_follows_following ON user_follows(followingId);
CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(userId);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expiresAt);
"#;

/// Sample debris hotspots from marine debris survey data.
/// Idempotent: re-running keeps existing rows.
pub const HOTSPOT_SEED: &str = r#"
INSERT OR IGNORE INTO debris_hotspots (id, location, debrisScore, lat, lon, description, createdAt) VALUES
    ('hotspot-1', 'Santa Monica Beach, CA', 8.5, 34.0195, -118.4912, 'High concentration of plastic bottles and food wrappers', '2024-01-01T00:00:00.000Z'),
    ('hotspot-2', 'Miami Beach, FL', 7.2, 25.7907, -80.1300, 'Frequent microplastic accumulation', '2024-01-01T00:00:00.000Z'),
    ('hotspot-3', 'Coney Island, NY', 6.8, 40.5755, -73.9707, 'Urban beach with high visitor traffic', '2024-01-01T00:00:00.000Z'),
    ('hotspot-4', 'Ocean Beach, San Francisco, CA', 7.9, 37.7594, -122.5107, 'Accumulated debris from ocean currents', '2024-01-01T00:00:00.000Z');
"#;
